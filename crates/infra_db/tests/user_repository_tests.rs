//! Integration tests for the user repository
//!
//! Each test starts its own PostgreSQL container. They are ignored by default;
//! run them with `cargo test -- --ignored` where a container runtime is
//! reachable. A missing runtime then fails the test.

use std::sync::Arc;

use core_kernel::{cache_key, CachePort, ErrorKind, HealthCheckable, InMemoryCache, UserId};
use domain_user::PasswordHasher;
use infra_db::{
    IntFilter, OneColumnSort, StringFilter, UserFilter, UserListParams, UserRepository,
};
use test_utils::{
    fake_user, test_database, CredentialFixtures, TestDatabase, UserFixtures,
    FIXTURE_PASSWORD,
};

fn repository(db: &TestDatabase, cache: Arc<InMemoryCache>) -> UserRepository {
    UserRepository::new(db.pool().clone(), cache, CredentialFixtures::hasher())
}

fn by_email(email: &str) -> UserListParams {
    UserListParams::new(UserFilter {
        email: Some(StringFilter::equals(email)),
        ..Default::default()
    })
}

// ============================================================================
// Insert / Get
// ============================================================================

mod insert_and_get {
    use super::*;

    /// Inserted users read back with sanitized fields and a hashed password
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_insert_then_get_round_trip() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::padded();
        repo.insert(&mut user).await.expect("insert failed");

        assert!(user.is_persisted());
        assert_ne!(user.password, FIXTURE_PASSWORD);
        assert!(PasswordHasher::is_hash(&user.password));

        let stored = repo.get_by_id(user.id).await.expect("get failed");
        assert_eq!(stored.email, "alan@example.com");
        assert_eq!(stored.first_name, "Alan");
        assert_eq!(stored.last_name, "Turing");
        assert_eq!(stored.password, user.password);
        assert!(repo.verify_password(&stored, FIXTURE_PASSWORD).is_ok());
    }

    /// Scenario A: the same email can only be inserted once
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_duplicate_email_is_conflict() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut first = UserFixtures::ada();
        first.email = "a@x.com".to_string();
        repo.insert(&mut first).await.expect("first insert failed");

        let mut second = UserFixtures::grace();
        second.email = "a@x.com".to_string();
        let error = repo.insert(&mut second).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert!(!second.is_persisted());
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    /// Racing inserts of one email: the unique constraint settles the tie
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_concurrent_duplicate_insert_is_conflict() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut first = UserFixtures::ada();
        let mut second = UserFixtures::grace();
        second.email = first.email.clone();

        let (a, b) = tokio::join!(repo.insert(&mut first), repo.insert(&mut second));

        let outcomes = [a, b];
        let conflicts: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind(), ErrorKind::Conflict);
        assert_eq!(
            conflicts[0].message(),
            Some(format!("user with email {} does already exist", first.email).as_str())
        );
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_invalid_user_is_unprocessable() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let error = repo.insert(&mut UserFixtures::invalid_email()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unprocessable);

        let error = repo.insert(&mut UserFixtures::short_password()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unprocessable);

        assert_eq!(db.count_users().await.unwrap(), 0);
    }

    /// Scenario B: unknown ids are not found
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_get_missing_is_not_found() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let error = repo.get_by_id(UserId::new(4242)).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}

// ============================================================================
// Update
// ============================================================================

mod update {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_update_names_keeps_password() {
        let db = test_database!();
        let cache = Arc::new(InMemoryCache::new());
        let repo = repository(&db, cache.clone());

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();
        let key = cache_key(UserId::prefix(), user.id);
        cache.set(&key, b"stale".to_vec()).await.unwrap();

        let old_hash = user.password.clone();
        user.first_name = " Augusta ".to_string();
        repo.update(&mut user, &old_hash, None).await.expect("update failed");

        assert_eq!(user.first_name, "Augusta");
        assert_eq!(user.password, old_hash);
        assert!(user.updated_at >= user.created_at);
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_password_change_with_old_password() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();

        let old_hash = user.password.clone();
        user.password = "a brand new secret".to_string();
        repo.update(&mut user, &old_hash, Some(FIXTURE_PASSWORD))
            .await
            .expect("password change failed");

        let stored = repo.get_by_id(user.id).await.unwrap();
        assert_ne!(stored.password, old_hash);
        assert!(repo.verify_password(&stored, "a brand new secret").is_ok());
        assert_eq!(
            repo.verify_password(&stored, FIXTURE_PASSWORD).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
    }

    /// Scenario C: a wrong old password leaves the stored hash alone
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_wrong_old_password_is_unauthorized() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();
        let old_hash = user.password.clone();

        let mut changed = user.clone();
        changed.password = "a brand new secret".to_string();
        let error = repo
            .update(&mut changed, &old_hash, Some("not the old password"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unauthorized);
        assert_eq!(repo.get_by_id(user.id).await.unwrap().password, old_hash);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_password_change_requires_old_password() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();
        let old_hash = user.password.clone();

        user.password = "a brand new secret".to_string();
        let error = repo.update(&mut user, &old_hash, None).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unprocessable);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_update_missing_is_not_found() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut ghost = UserFixtures::ada();
        ghost.id = UserId::new(999);
        ghost.password = CredentialFixtures::hasher().hash(FIXTURE_PASSWORD).unwrap();
        let hash = ghost.password.clone();

        let error = repo.update(&mut ghost, &hash, None).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}

// ============================================================================
// Delete
// ============================================================================

mod delete {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_delete_removes_row_and_is_idempotent() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();

        repo.delete(user.id).await.expect("delete failed");
        assert_eq!(repo.get_by_id(user.id).await.unwrap_err().kind(), ErrorKind::NotFound);

        repo.delete(user.id).await.expect("second delete failed");
    }

    /// Scenario D: a referenced user cannot be deleted
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_delete_referenced_is_unprocessable() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();
        db.add_note(user.id.get(), "keeps the user alive").await.unwrap();

        let error = repo.delete(user.id).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unprocessable);
        assert!(repo.get_by_id(user.id).await.is_ok());
    }
}

// ============================================================================
// List
// ============================================================================

mod list {
    use super::*;

    async fn seed(repo: &UserRepository, count: usize) -> Vec<UserId> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let mut user = fake_user();
            repo.insert(&mut user).await.expect("seed insert failed");
            ids.push(user.id);
        }
        ids
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_unset_filter_returns_all_rows() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));
        seed(&repo, 3).await;

        let users = repo.list(&UserListParams::default()).await.unwrap();

        assert_eq!(users.len(), 3);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_empty_table_lists_nothing() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        assert!(repo.list(&UserListParams::default()).await.unwrap().is_empty());
    }

    /// Scenario E: limit 2 offset 1 over five rows by id returns ranks 2 and 3
    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_pagination_by_id() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));
        let ids = seed(&repo, 5).await;

        let params = UserListParams::default()
            .with_sort(OneColumnSort::asc("id"))
            .with_pagination(2, 1);
        let page: Vec<UserId> = repo.list(&params).await.unwrap().into_iter().map(|u| u.id).collect();

        assert_eq!(page, vec![ids[1], ids[2]]);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_empty_one_of_matches_nothing() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));
        seed(&repo, 2).await;

        let params = UserListParams::new(UserFilter {
            id: Some(IntFilter::one_of(Vec::new())),
            ..Default::default()
        });

        assert!(repo.list(&params).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_filters_combine() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut ada = UserFixtures::ada();
        let mut grace = UserFixtures::grace();
        repo.insert(&mut ada).await.unwrap();
        repo.insert(&mut grace).await.unwrap();

        let found = repo.list(&by_email("grace@example.com")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, grace.id);

        let params = UserListParams::new(UserFilter {
            id: Some(IntFilter::one_of([ada.id.get(), grace.id.get()])),
            description: Some(StringFilter::contains("programmer")),
            ..Default::default()
        });
        let found = repo.list(&params).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ada.id);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_contains_matches_wildcards_literally() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada().with_description("100% real");
        repo.insert(&mut user).await.unwrap();
        let mut other = UserFixtures::grace().with_description("1000 real");
        repo.insert(&mut other).await.unwrap();

        let params = UserListParams::new(UserFilter {
            description: Some(StringFilter::contains("0%")),
            ..Default::default()
        });
        let found = repo.list(&params).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, user.id);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_unknown_sort_is_unprocessable() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let params = UserListParams::default().with_sort(OneColumnSort::desc("favourite_colour"));
        let error = repo.list(&params).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unprocessable);
    }
}

// ============================================================================
// Health / Reset
// ============================================================================

mod maintenance {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_health_check_reports_healthy() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let health = repo.health_check().await;

        assert!(health.is_healthy());
        assert_eq!(health.adapter_id, "postgres-user-repository");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_clear_data_resets_users() {
        let db = test_database!();
        let repo = repository(&db, Arc::new(InMemoryCache::new()));

        let mut user = UserFixtures::ada();
        repo.insert(&mut user).await.unwrap();
        db.clear_data().await.unwrap();

        assert_eq!(db.count_users().await.unwrap(), 0);
    }
}
