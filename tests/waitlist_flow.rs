//! End-to-end flows over the file-backed store, including a restart.

use std::sync::Arc;

use secrecy::SecretString;
use url::Url;

use waitlist::notifier::LogNotifier;
use waitlist::registry::models::{verification_key, PendingVerification};
use waitlist::registry::{Authentication, Confirmation, Waitlist, WalletUpdate};
use waitlist::store::{KeyValueStore, RedbStore};

fn waitlist_over(store: Arc<RedbStore>) -> Waitlist {
    Waitlist::new(
        store,
        Arc::new(LogNotifier),
        Url::parse("https://waitlist.example/").unwrap(),
    )
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn pending_code(store: &RedbStore, email: &str) -> String {
    let raw = store.get(&verification_key(email)).unwrap().unwrap();
    let pending: PendingVerification = serde_json::from_slice(&raw).unwrap();
    pending.code
}

async fn register(waitlist: &Waitlist, store: &RedbStore, email: &str, referral: Option<&str>) -> u64 {
    waitlist
        .request_verification(email, &secret("Passw0rd!"))
        .await
        .unwrap();
    let code = pending_code(store, email);
    match waitlist
        .confirm_verification(email, &code, referral)
        .await
        .unwrap()
    {
        Confirmation::Verified(v) => v.position,
        Confirmation::InvalidOrExpiredCode => panic!("confirmation rejected for {email}"),
    }
}

#[tokio::test]
async fn referral_flow_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("waitlist.redb")).unwrap());
    let waitlist = waitlist_over(store.clone());

    assert_eq!(register(&waitlist, &store, "a@x.com", None).await, 1);

    let Authentication::Authenticated(account) = waitlist
        .authenticate("a@x.com", &secret("Passw0rd!"))
        .unwrap()
    else {
        panic!("expected login success");
    };
    let referral_code = account
        .referral_link
        .split("ref=")
        .nth(1)
        .expect("referral link carries a code")
        .to_string();

    assert_eq!(
        register(&waitlist, &store, "b@x.com", Some(&referral_code)).await,
        2
    );

    let snapshot = waitlist.referral_snapshot().unwrap();
    assert_eq!(snapshot.total_users, 2);
    assert_eq!(snapshot.referrals.get("a@x.com"), Some(&1));

    assert_eq!(
        waitlist
            .submit_wallet("b@x.com", Some("So1anaWa11etAddressThatIs43CharactersLong43"), None)
            .unwrap(),
        WalletUpdate::Updated
    );
}

#[tokio::test]
async fn records_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("waitlist.redb");

    {
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let waitlist = waitlist_over(store.clone());
        register(&waitlist, &store, "a@x.com", None).await;
    }

    // Fresh store handle and registry over the same file.
    let store = Arc::new(RedbStore::open(&path).unwrap());
    let waitlist = waitlist_over(store.clone());

    assert_eq!(waitlist.total_user_count().unwrap(), 1);
    let Authentication::Authenticated(account) = waitlist
        .authenticate("a@x.com", &secret("Passw0rd!"))
        .unwrap()
    else {
        panic!("expected login success after restart");
    };
    assert_eq!(account.position, 1);

    // Positions keep counting from where they left off.
    assert_eq!(register(&waitlist, &store, "b@x.com", None).await, 2);
}

#[tokio::test]
async fn password_reset_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("waitlist.redb")).unwrap());
    let waitlist = waitlist_over(store.clone());

    register(&waitlist, &store, "a@x.com", None).await;
    waitlist.request_password_reset("a@x.com").await.unwrap();

    let raw = store
        .get(&waitlist::registry::models::reset_key("a@x.com"))
        .unwrap()
        .unwrap();
    let code = String::from_utf8(raw).unwrap();

    use waitlist::registry::{ResetCodeCheck, ResetCompletion};
    assert_eq!(
        waitlist.confirm_password_reset("a@x.com", &code).unwrap(),
        ResetCodeCheck::Valid
    );
    assert_eq!(
        waitlist
            .complete_password_reset("a@x.com", &secret("NewPassw0rd!"))
            .unwrap(),
        ResetCompletion::PasswordChanged
    );

    assert!(matches!(
        waitlist
            .authenticate("a@x.com", &secret("NewPassw0rd!"))
            .unwrap(),
        Authentication::Authenticated(_)
    ));
    assert_eq!(
        waitlist
            .authenticate("a@x.com", &secret("Passw0rd!"))
            .unwrap(),
        Authentication::InvalidCredentials
    );
}
