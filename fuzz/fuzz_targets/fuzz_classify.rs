#![no_main]

use libfuzzer_sys::fuzz_target;
use plugin_registry::fetcher::{candidates, GITHUB_RAW_BASE};
use plugin_registry::repo::{classify, RepoRef};

fuzz_target!(|data: &[u8]| {
    let Ok(url) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(repo) = classify(url) {
        let list = candidates(&repo, "README.md", GITHUB_RAW_BASE);
        let expected = match repo {
            RepoRef::GitHub { .. } => 2,
            RepoRef::Generic { .. } => 4,
        };
        assert_eq!(list.len(), expected);
        assert_eq!(list[0].branch, "main");
    }
});
