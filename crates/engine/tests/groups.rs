use chrono::{TimeDelta, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use engine::{
    Currency, Engine, EngineError, ExpenseCmd, ExpenseKind, ExpenseListFilter, GroupRole,
    LOGIN_CODE_MAX_ATTEMPTS, LoginForm, Money, SettlementCmd, Share, SplitMode, Transfer, Weight,
    EMAIL_INVALID, EMAIL_REQUIRED,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn login(engine: &Engine, email: &str) -> String {
    let challenge = engine
        .request_login_code(&LoginForm::new(email))
        .await
        .unwrap();
    let session = engine
        .verify_login_code(email, &challenge.code)
        .await
        .unwrap();
    session.user.id
}

/// Alice owns a EUR group with Bob and Carol.
async fn trip(engine: &Engine) -> (String, String, String, String) {
    let alice = login(engine, "alice@example.com").await;
    let group_id = engine
        .new_group("Week-end à Lyon", None, &alice)
        .await
        .unwrap();
    let bob = engine
        .add_member(&group_id, "bob@example.com", &alice)
        .await
        .unwrap()
        .id;
    let carol = engine
        .add_member(&group_id, "carol@example.com", &alice)
        .await
        .unwrap()
        .id;
    (group_id, alice, bob, carol)
}

#[tokio::test]
async fn login_flow_issues_a_session() {
    let (engine, _db) = engine_with_db().await;

    let challenge = engine
        .request_login_code(&LoginForm::new("Alice@Example.com"))
        .await
        .unwrap();
    assert!(challenge.created);
    assert_eq!(challenge.user.email, "alice@example.com");
    assert_eq!(challenge.code.len(), 6);

    let err = engine
        .verify_login_code("alice@example.com", "not-it")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Unauthorized("invalid or expired login code".to_string())
    );

    let session = engine
        .verify_login_code("alice@example.com", &challenge.code)
        .await
        .unwrap();
    let user = engine.authenticate(&session.token).await.unwrap();
    assert_eq!(user.id, challenge.user.id);

    // Codes are single use.
    assert!(
        engine
            .verify_login_code("alice@example.com", &challenge.code)
            .await
            .is_err()
    );

    engine.logout(&session.token).await.unwrap();
    assert_eq!(
        engine.authenticate(&session.token).await.unwrap_err(),
        EngineError::Unauthorized("invalid session".to_string())
    );
}

#[tokio::test]
async fn second_login_reuses_the_account() {
    let (engine, _db) = engine_with_db().await;
    let first = login(&engine, "alice@example.com").await;
    let challenge = engine
        .request_login_code(&LoginForm::new("ALICE@example.com"))
        .await
        .unwrap();
    assert!(!challenge.created);
    assert_eq!(challenge.user.id, first);
}

#[tokio::test]
async fn login_form_errors_carry_french_messages() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .request_login_code(&LoginForm::new(""))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(errors.field("email"), Some(EMAIL_REQUIRED));

    let err = engine
        .request_login_code(&LoginForm::new("pas-un-email"))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(errors.field("email"), Some(EMAIL_INVALID));
}

#[tokio::test]
async fn expired_login_code_is_rejected() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .login_code_ttl(TimeDelta::zero())
        .build()
        .await
        .unwrap();

    let challenge = engine
        .request_login_code(&LoginForm::new("alice@example.com"))
        .await
        .unwrap();
    assert!(
        engine
            .verify_login_code("alice@example.com", &challenge.code)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn login_code_is_discarded_after_too_many_wrong_guesses() {
    let (engine, _db) = engine_with_db().await;
    let email = "alice@example.com";

    let challenge = engine
        .request_login_code(&LoginForm::new(email))
        .await
        .unwrap();
    let wrong = if challenge.code == "000000" { "111111" } else { "000000" };
    for _ in 0..LOGIN_CODE_MAX_ATTEMPTS {
        assert_eq!(
            engine.verify_login_code(email, wrong).await.unwrap_err(),
            EngineError::Unauthorized("invalid or expired login code".to_string())
        );
    }
    assert!(engine.verify_login_code(email, &challenge.code).await.is_err());

    // A fresh code starts a fresh count.
    let challenge = engine
        .request_login_code(&LoginForm::new(email))
        .await
        .unwrap();
    let wrong = if challenge.code == "000000" { "111111" } else { "000000" };
    for _ in 1..LOGIN_CODE_MAX_ATTEMPTS {
        assert!(engine.verify_login_code(email, wrong).await.is_err());
    }
    let session = engine
        .verify_login_code(email, &challenge.code)
        .await
        .unwrap();
    assert_eq!(session.user.email, email);
}

#[tokio::test]
async fn profile_update_sets_display_name() {
    let (engine, _db) = engine_with_db().await;
    let alice = login(&engine, "alice@example.com").await;

    let user = engine.update_profile(&alice, Some("  Alice ")).await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
    assert_eq!(user.label(), "Alice");

    let user = engine.update_profile(&alice, Some("")).await.unwrap();
    assert_eq!(user.display_name, None);
    assert_eq!(user.label(), "alice@example.com");
}

#[tokio::test]
async fn creator_owns_the_group_and_members_are_listed() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, carol) = trip(&engine).await;

    let group = engine.group(&group_id, &bob).await.unwrap();
    assert_eq!(group.name, "Week-end à Lyon");
    assert_eq!(group.currency, Currency::Eur);
    assert_eq!(group.owner().unwrap().user.id, alice);
    let ids: Vec<&str> = group.members.iter().map(|m| m.user.id.as_str()).collect();
    assert_eq!(ids, vec![alice.as_str(), bob.as_str(), carol.as_str()]);

    let listed = engine.list_groups(&carol).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].role, GroupRole::Member);
    assert_eq!(listed[0].member_count, 3);
}

#[tokio::test]
async fn group_names_are_unique_per_owner() {
    let (engine, _db) = engine_with_db().await;
    let alice = login(&engine, "alice@example.com").await;
    let bob = login(&engine, "bob@example.com").await;

    engine.new_group("Coloc", None, &alice).await.unwrap();
    let err = engine.new_group("coloc", None, &alice).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("coloc".to_string()));

    // Another owner may reuse the name.
    engine.new_group("Coloc", Some(Currency::Chf), &bob).await.unwrap();
}

#[tokio::test]
async fn accented_group_names_clash_regardless_of_case() {
    let (engine, _db) = engine_with_db().await;
    let alice = login(&engine, "alice@example.com").await;

    engine.new_group("Été", None, &alice).await.unwrap();
    let err = engine.new_group("été", None, &alice).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("été".to_string()));

    let hiver = engine.new_group("Hiver", None, &alice).await.unwrap();
    let err = engine
        .rename_group(&hiver, "ÉTÉ", &alice)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("ÉTÉ".to_string()));
    // Renaming a group to a new casing of its own name is fine.
    engine.rename_group(&hiver, "HIVER", &alice).await.unwrap();
}

#[tokio::test]
async fn outsiders_cannot_see_a_group() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, ..) = trip(&engine).await;
    let mallory = login(&engine, "mallory@example.com").await;

    let err = engine.group(&group_id, &mallory).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
    let err = engine.group_balances(&group_id, &mallory).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
}

#[tokio::test]
async fn only_the_owner_manages_the_group() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;

    let err = engine
        .rename_group(&group_id, "Lyon", &bob)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("only the group owner can rename it".to_string())
    );
    let err = engine
        .add_member(&group_id, "dave@example.com", &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.rename_group(&group_id, "Lyon", &alice).await.unwrap();
    assert_eq!(engine.group(&group_id, &alice).await.unwrap().name, "Lyon");
}

#[tokio::test]
async fn adding_a_member_twice_fails() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, ..) = trip(&engine).await;

    let err = engine
        .add_member(&group_id, "BOB@example.com", &alice)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("bob@example.com".to_string()));

    let err = engine
        .add_member(&group_id, "bob", &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn invited_member_claims_the_account_on_login() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, _, bob, _) = trip(&engine).await;

    let bob_again = login(&engine, "bob@example.com").await;
    assert_eq!(bob_again, bob);
    assert_eq!(engine.list_groups(&bob).await.unwrap()[0].id, group_id);
}

#[tokio::test]
async fn equal_split_balances_and_settle_up() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, carol) = trip(&engine).await;

    // Alice pays 100.00 for three: 33.34 / 33.33 / 33.33.
    engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Courses",
            10_000,
            SplitMode::equal([&alice, &bob, &carol]),
            Utc::now(),
        ))
        .await
        .unwrap();

    let balances = engine.group_balances(&group_id, &bob).await.unwrap();
    let nets: Vec<i64> = balances.iter().map(|b| b.net_minor).collect();
    assert_eq!(nets, vec![6_666, -3_333, -3_333]);
    assert_eq!(nets.iter().sum::<i64>(), 0);

    let transfers = engine.settle_up(&group_id, &carol).await.unwrap();
    assert!(transfers.contains(&Transfer {
        from_user_id: bob.clone(),
        to_user_id: alice.clone(),
        amount_minor: 3_333,
    }));
    assert!(transfers.contains(&Transfer {
        from_user_id: carol.clone(),
        to_user_id: alice.clone(),
        amount_minor: 3_333,
    }));
    assert_eq!(transfers.len(), 2);
}

#[tokio::test]
async fn settlements_zero_the_balances() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;

    engine
        .add_expense(
            ExpenseCmd::new(
                &group_id,
                &alice,
                "Restaurant",
                4_000,
                SplitMode::Exact {
                    shares: vec![Share::new(&alice, 1_500), Share::new(&bob, 2_500)],
                },
                Utc::now(),
            )
            .paid_by(&alice),
        )
        .await
        .unwrap();

    engine
        .record_settlement(SettlementCmd::new(
            &group_id,
            &bob,
            &bob,
            &alice,
            2_500,
            Utc::now(),
        ))
        .await
        .unwrap();

    assert!(engine.settle_up(&group_id, &alice).await.unwrap().is_empty());

    let settlements = engine
        .list_expenses(
            &group_id,
            &alice,
            &ExpenseListFilter {
                kind: Some(ExpenseKind::Settlement),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].description, "Remboursement");
    assert_eq!(settlements[0].paid_by, bob);
    assert_eq!(settlements[0].share_of(&alice), 2_500);
}

#[tokio::test]
async fn weighted_split_follows_the_weights() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, carol) = trip(&engine).await;

    // 10.00 weighted 2:1, the odd cent goes to the larger remainder.
    let expense_id = engine
        .add_expense(
            ExpenseCmd::new(
                &group_id,
                &bob,
                "Essence",
                1_000,
                SplitMode::Weighted {
                    weights: vec![
                        Weight {
                            user_id: alice.clone(),
                            weight: 2,
                        },
                        Weight {
                            user_id: bob.clone(),
                            weight: 1,
                        },
                    ],
                },
                Utc::now(),
            )
            .paid_by(&bob),
        )
        .await
        .unwrap();

    let expense = engine.expense(&group_id, expense_id, &carol).await.unwrap();
    assert_eq!(expense.share_of(&alice), 667);
    assert_eq!(expense.share_of(&bob), 333);
    assert_eq!(expense.share_of(&carol), 0);

    let nets: Vec<i64> = engine
        .group_balances(&group_id, &alice)
        .await
        .unwrap()
        .iter()
        .map(|b| b.net_minor)
        .collect();
    assert_eq!(nets, vec![-667, 667, 0]);
}

#[tokio::test]
async fn expense_rules_are_enforced() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;
    let mallory = login(&engine, "mallory@example.com").await;

    let err = engine
        .add_expense(
            ExpenseCmd::new(
                &group_id,
                &alice,
                "Taxi",
                1_000,
                SplitMode::equal([&alice, &bob]),
                Utc::now(),
            )
            .currency(Currency::Usd),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::CurrencyMismatch("group currency is EUR, got USD".to_string())
    );

    let err = engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Taxi",
            1_000,
            SplitMode::equal([&alice, &mallory]),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidSplit(format!("user {mallory} is not a member of this group"))
    );

    let err = engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Taxi",
            1_000,
            SplitMode::Exact {
                shares: vec![Share::new(&alice, 400), Share::new(&bob, 400)],
            },
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));

    // Nothing was written.
    let listed = engine
        .list_expenses(&group_id, &alice, &ExpenseListFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn voided_expenses_leave_the_balances() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, carol) = trip(&engine).await;

    let expense_id = engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &bob,
            "Essence",
            6_000,
            SplitMode::equal([&alice, &bob, &carol]),
            Utc::now(),
        ))
        .await
        .unwrap();

    let expense = engine.expense(&group_id, expense_id, &carol).await.unwrap();
    assert_eq!(expense.shares.len(), 3);
    assert_eq!(expense.paid_by, bob);

    let err = engine
        .void_expense(&group_id, expense_id, &carol, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine
        .void_expense(&group_id, expense_id, &bob, Utc::now())
        .await
        .unwrap();
    let err = engine
        .void_expense(&group_id, expense_id, &alice, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("expense already voided".to_string())
    );

    let balances = engine.group_balances(&group_id, &alice).await.unwrap();
    assert!(balances.iter().all(|b| b.net_minor == 0));

    let visible = engine
        .list_expenses(&group_id, &alice, &ExpenseListFilter::default())
        .await
        .unwrap();
    assert!(visible.is_empty());
    let all = engine
        .list_expenses(
            &group_id,
            &alice,
            &ExpenseListFilter {
                include_voided: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_voided());
    assert_eq!(all[0].voided_by.as_deref(), Some(bob.as_str()));
}

#[tokio::test]
async fn listing_is_newest_first_and_limited() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;
    let start = Utc::now() - TimeDelta::days(10);

    for day in 0..5 {
        engine
            .add_expense(ExpenseCmd::new(
                &group_id,
                &alice,
                format!("Jour {day}"),
                1_000,
                SplitMode::equal([&alice, &bob]),
                start + TimeDelta::days(day),
            ))
            .await
            .unwrap();
    }

    let listed = engine
        .list_expenses(
            &group_id,
            &bob,
            &ExpenseListFilter {
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let descriptions: Vec<&str> = listed.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Jour 4", "Jour 3"]);
    assert!(listed.iter().all(|e| e.shares.len() == 2));
}

#[tokio::test]
async fn members_leave_only_when_settled() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, carol) = trip(&engine).await;

    engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Billets",
            2_000,
            SplitMode::equal([&alice, &bob]),
            Utc::now(),
        ))
        .await
        .unwrap();

    let err = engine
        .remove_member(&group_id, &bob, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .remove_member(&group_id, &carol, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .remove_member(&group_id, &alice, &alice)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("the group owner cannot be removed".to_string())
    );

    // Carol never took part: she can leave.
    engine.remove_member(&group_id, &carol, &carol).await.unwrap();
    assert!(engine.list_groups(&carol).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_group_removes_its_ledger() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;

    engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Location",
            9_000,
            SplitMode::equal([&alice, &bob]),
            Utc::now(),
        ))
        .await
        .unwrap();

    let err = engine.delete_group(&group_id, &bob).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.delete_group(&group_id, &alice).await.unwrap();
    assert!(engine.list_groups(&alice).await.unwrap().is_empty());
    let err = engine.group(&group_id, &alice).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
}

#[tokio::test]
async fn registering_without_a_code_is_idempotent() {
    let (engine, _db) = engine_with_db().await;

    let (user, created) = engine
        .register_user(&LoginForm::new("dana@example.com"))
        .await
        .unwrap();
    assert!(created);
    let (again, created) = engine
        .register_user(&LoginForm::new("Dana@Example.com"))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, user.id);

    assert_eq!(engine.user_by_email(" DANA@example.com").await.unwrap().id, user.id);
    assert_eq!(
        engine.user_by_email("nobody@example.com").await.unwrap_err(),
        EngineError::KeyNotFound("user not exists".to_string())
    );
}

#[tokio::test]
async fn oversized_expense_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;

    let err = engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Yacht",
            6_000_000_000_000_000_000,
            SplitMode::equal([&alice, &bob]),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine
        .add_expense(ExpenseCmd::new(
            &group_id,
            &alice,
            "Maison",
            Money::MAX_AMOUNT.minor(),
            SplitMode::equal([&alice, &bob]),
            Utc::now(),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn overflowing_ledger_is_an_error() {
    let (engine, db) = engine_with_db().await;
    let (group_id, alice, bob, _) = trip(&engine).await;

    for description in ["Hôtel", "Avion"] {
        engine
            .add_expense(ExpenseCmd::new(
                &group_id,
                &alice,
                description,
                100,
                SplitMode::equal([&bob]),
                Utc::now(),
            ))
            .await
            .unwrap();
    }
    // Rows written before amounts were bounded.
    db.execute_unprepared("UPDATE expenses SET amount_minor = 6000000000000000000")
        .await
        .unwrap();
    db.execute_unprepared("UPDATE expense_shares SET amount_minor = 6000000000000000000")
        .await
        .unwrap();

    let expected =
        EngineError::InvalidAmount("group ledger total is out of range".to_string());
    assert_eq!(engine.group_balances(&group_id, &alice).await.unwrap_err(), expected);
    assert_eq!(engine.settle_up(&group_id, &bob).await.unwrap_err(), expected);
    assert_eq!(
        engine.remove_member(&group_id, &bob, &alice).await.unwrap_err(),
        expected
    );
}
