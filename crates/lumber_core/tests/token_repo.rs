use lumber_core::db::open_db_in_memory;
use lumber_core::{
    RepoError, SqliteTokenRepository, Token, TokenRepository, TokenService, TokenServiceError,
};
use std::collections::HashSet;

#[test]
fn save_get_and_find_by_value() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();

    let id = repo.save(&Token::new("foo")).unwrap();
    let by_id = repo.get(id).unwrap();
    let by_value = repo.find_by_value("foo").unwrap();

    assert_eq!(by_id, by_value);
    assert_eq!(by_id.value, "foo");
    assert!(by_id.created_at > 0);
}

#[test]
fn missing_tokens_return_token_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();

    assert!(matches!(repo.get(1), Err(RepoError::TokenNotFound)));
    assert!(matches!(
        repo.find_by_value("nope"),
        Err(RepoError::TokenNotFound)
    ));
}

#[test]
fn duplicate_value_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();

    repo.save(&Token::new("foo")).unwrap();
    let err = repo.save(&Token::new("foo")).unwrap_err();
    assert!(matches!(err, RepoError::Conflict("tokens.value")));
}

#[test]
fn empty_value_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.save(&Token::new("")),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn update_changes_value_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();
    let id = repo.save(&Token::new("old")).unwrap();
    repo.save(&Token::new("other")).unwrap();

    let mut token = repo.get(id).unwrap();
    token.value = "new".to_string();
    repo.update(&token).unwrap();
    assert_eq!(repo.find_by_value("new").unwrap().id, id);
    assert!(repo.find_by_value("old").is_err());

    token.value = "other".to_string();
    assert!(matches!(repo.update(&token), Err(RepoError::Conflict(_))));

    let mut missing = Token::new("ghost");
    missing.id = 99;
    assert!(matches!(
        repo.update(&missing),
        Err(RepoError::TokenNotFound)
    ));
}

#[test]
fn delete_reports_whether_row_existed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();
    let id = repo.save(&Token::new("foo")).unwrap();

    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
}

#[test]
fn issuance_over_sqlite_never_repeats_values() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();
    let service = TokenService::new(&repo);

    let mut values = HashSet::new();
    for _ in 0..25 {
        let token = service.issue_token().unwrap();
        assert_eq!(service.get(token.id).unwrap().value, token.value);
        assert!(values.insert(token.value));
    }
}

#[test]
fn issuance_retries_on_unique_index_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();
    repo.save(&Token::new("taken")).unwrap();

    let service = TokenService::with_generator(&repo, || "taken".to_string());
    assert!(matches!(
        service.issue_token(),
        Err(TokenServiceError::ExhaustedAttempts(20))
    ));
}

#[test]
fn revoke_removes_token() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTokenRepository::try_new(&conn).unwrap();
    let service = TokenService::new(&repo);

    let token = service.issue_token().unwrap();
    assert!(service.revoke(token.id).unwrap());
    assert!(matches!(
        service.find_by_value(&token.value),
        Err(TokenServiceError::Repo(RepoError::TokenNotFound))
    ));
}
