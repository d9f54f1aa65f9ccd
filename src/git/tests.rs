use super::*;
use crate::test_utils::{SvnHistoryRepo, file_url};
use tempfile::TempDir;

const SVN_URL: &str = "svn://svn.example.org/trunk/src";

#[tokio::test]
async fn test_clone_mirror_and_search() {
    let temp = TempDir::new().unwrap();
    let upstream = SvnHistoryRepo::create(temp.path().join("upstream"), SVN_URL, &[10, 11, 12]).unwrap();
    let target = temp.path().join("mirror.git");

    let repo = GitRepo::clone_mirror(&upstream.url(), &target, None, Some("src")).await.unwrap();
    assert_eq!(repo.kind(), CloneKind::Mirror);
    assert!(repo.is_git_repo());

    let found = repo.search_svn_revision("11", "refs/heads/master", None).await.unwrap();
    assert_eq!(found.as_deref(), upstream.commit_for(11));

    let missing = repo.search_svn_revision("13", "refs/heads/master", None).await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_search_does_not_match_revision_prefixes() {
    let temp = TempDir::new().unwrap();
    let upstream = SvnHistoryRepo::create(temp.path().join("upstream"), SVN_URL, &[1234]).unwrap();
    let repo = GitRepo::clone_mirror(&upstream.url(), temp.path().join("m.git"), None, None).await.unwrap();

    assert_eq!(repo.search_svn_revision("123", "refs/heads/master", None).await.unwrap(), None);
    assert_eq!(repo.search_svn_revision("234", "refs/heads/master", None).await.unwrap(), None);
    assert!(repo.search_svn_revision("1234", "refs/heads/master", None).await.unwrap().is_some());
}

#[tokio::test]
async fn test_search_unknown_ref_is_not_found() {
    let temp = TempDir::new().unwrap();
    let upstream = SvnHistoryRepo::create(temp.path().join("upstream"), SVN_URL, &[1]).unwrap();
    let repo = GitRepo::clone_mirror(&upstream.url(), temp.path().join("m.git"), None, None).await.unwrap();

    let result = repo.search_svn_revision("1", "refs/branch-heads/none", None).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_fetch_mirror_sees_new_commits() {
    let temp = TempDir::new().unwrap();
    let mut upstream = SvnHistoryRepo::create(temp.path().join("upstream"), SVN_URL, &[1]).unwrap();
    let repo = GitRepo::clone_mirror(&upstream.url(), temp.path().join("m.git"), None, None).await.unwrap();

    let newer = upstream.commit(2).unwrap();
    assert_eq!(repo.search_svn_revision("2", "refs/heads/master", None).await.unwrap(), None);

    repo.fetch(None).await.unwrap();
    assert_eq!(repo.search_svn_revision("2", "refs/heads/master", None).await.unwrap(), Some(newer));
}

#[tokio::test]
async fn test_clone_checkout_and_fetch_branch_heads() {
    let temp = TempDir::new().unwrap();
    let mut upstream = SvnHistoryRepo::create(temp.path().join("upstream"), SVN_URL, &[1]).unwrap();
    upstream.git().create_branch("release").unwrap();
    let on_branch = upstream.commit(2).unwrap();
    upstream.git().set_branch_head("42", &on_branch).unwrap();
    upstream.git().checkout("master").unwrap();

    let repo = GitRepo::clone_checkout(&upstream.url(), temp.path().join("work"), None).await.unwrap();
    assert_eq!(repo.kind(), CloneKind::Checkout);
    assert!(repo.path().join(".git").exists());

    repo.fetch(None).await.unwrap();
    let found = repo.search_svn_revision("2", "refs/remotes/branch-heads/42", None).await.unwrap();
    assert_eq!(found, Some(on_branch));
    let found = repo.search_svn_revision("1", "refs/remotes/origin/master", None).await.unwrap();
    assert_eq!(found.as_deref(), upstream.commit_for(1));
}

#[tokio::test]
async fn test_clone_failure_is_typed() {
    let temp = TempDir::new().unwrap();
    let missing = file_url(&temp.path().join("does-not-exist"));
    let err = GitRepo::clone_mirror(&missing, temp.path().join("m.git"), None, None).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<DepsError>(), Some(DepsError::GitCloneFailed { .. })));
}

#[tokio::test]
async fn test_ping() {
    let temp = TempDir::new().unwrap();
    let upstream = SvnHistoryRepo::create(temp.path().join("upstream"), SVN_URL, &[1]).unwrap();

    assert!(GitRepo::ping(&upstream.url()).await);
    assert!(!GitRepo::ping(&file_url(&temp.path().join("nothing-here"))).await);
}

#[test]
fn test_is_valid_git_repo() {
    let temp = TempDir::new().unwrap();
    assert!(!is_valid_git_repo(temp.path()));

    std::fs::create_dir(temp.path().join(".git")).unwrap();
    assert!(is_valid_git_repo(temp.path()));

    let bare = temp.path().join("bare");
    std::fs::create_dir_all(bare.join("objects")).unwrap();
    std::fs::create_dir_all(bare.join("refs")).unwrap();
    std::fs::write(bare.join("HEAD"), "ref: refs/heads/master\n").unwrap();
    assert!(is_valid_git_repo(&bare));
}

#[test]
fn test_git_is_installed() {
    assert!(is_git_installed());
    ensure_git_available().unwrap();
}
