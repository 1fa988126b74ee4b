use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::WalletProvider;

/// Account list as reported by the wallet; the first entry is active
pub type Accounts = Vec<String>;

/// Tracks the accounts exposed by a wallet provider.
///
/// Mounting requests account access once. When access is granted the
/// connector subscribes to account changes; the subscription is released
/// when the connector is dropped or [`WalletConnector::unmount`] is called.
pub struct WalletConnector {
    accounts: Arc<watch::Sender<Accounts>>,
    subscription: Option<AccountSubscription>,
}

impl WalletConnector {
    /// Connector with no wallet behind it; the account list stays empty
    pub fn disconnected() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            accounts: Arc::new(tx),
            subscription: None,
        }
    }

    /// Request access once, then follow account changes.
    ///
    /// A rejected request leaves the account list empty, is only logged, and
    /// no subscription is taken.
    pub async fn mount(provider: Arc<dyn WalletProvider>, poll_interval: Duration) -> Self {
        let mut connector = Self::disconnected();
        match provider.request_accounts().await {
            Ok(accounts) => {
                info!("Wallet connected with {} account(s)", accounts.len());
                connector.accounts.send_replace(accounts);
                connector.subscription = Some(AccountSubscription::spawn(
                    provider,
                    Arc::clone(&connector.accounts),
                    poll_interval,
                ));
            }
            Err(e) if e.is_user_rejection() => {
                debug!("Wallet access rejected by user");
            }
            Err(e) => {
                debug!("Wallet access request failed: {}", e);
            }
        }
        connector
    }

    /// Overwrite the stored list with a change notification
    pub fn notify_accounts_changed(&self, accounts: Accounts) {
        debug!("Accounts changed: {:?}", accounts);
        self.accounts.send_replace(accounts);
    }

    pub fn accounts(&self) -> Accounts {
        self.accounts.borrow().clone()
    }

    pub fn active_account(&self) -> Option<String> {
        self.accounts.borrow().first().cloned()
    }

    /// Receiver that always yields the current account list
    pub fn watch(&self) -> watch::Receiver<Accounts> {
        self.accounts.subscribe()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Release the change subscription; the last known accounts are kept
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// Live subscription to wallet account changes. Dropping it unsubscribes.
pub struct AccountSubscription {
    handle: JoinHandle<()>,
}

impl AccountSubscription {
    fn spawn(
        provider: Arc<dyn WalletProvider>,
        accounts: Arc<watch::Sender<Accounts>>,
        poll_interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match provider.accounts().await {
                    Ok(latest) => {
                        let changed = accounts.send_if_modified(|current| {
                            if *current != latest {
                                *current = latest;
                                true
                            } else {
                                false
                            }
                        });
                        if changed {
                            info!("Wallet accounts changed");
                        }
                    }
                    Err(e) => debug!("Failed to poll wallet accounts: {}", e),
                }
            }
        });
        Self { handle }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for AccountSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{StaticWallet, WalletError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Wallet that grants access and then reports a scripted sequence of
    /// account lists, repeating the last one
    struct ScriptedWallet {
        grant: Result<Accounts, i64>,
        polls: Mutex<Vec<Accounts>>,
        poll_count: AtomicUsize,
    }

    impl ScriptedWallet {
        fn new(grant: Result<Accounts, i64>, polls: Vec<Accounts>) -> Arc<Self> {
            Arc::new(Self {
                grant,
                polls: Mutex::new(polls),
                poll_count: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl WalletProvider for ScriptedWallet {
        async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
            self.grant.clone().map_err(|code| WalletError::Rpc {
                code,
                message: "User rejected the request.".to_string(),
            })
        }

        async fn accounts(&self) -> Result<Vec<String>, WalletError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            let mut polls = self.polls.lock().unwrap();
            if polls.len() > 1 {
                Ok(polls.remove(0))
            } else {
                Ok(polls.first().cloned().unwrap_or_default())
            }
        }
    }

    fn accounts(list: &[&str]) -> Accounts {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_disconnected_has_no_account() {
        let connector = WalletConnector::disconnected();
        assert!(connector.accounts().is_empty());
        assert!(connector.active_account().is_none());
        assert!(!connector.is_subscribed());
    }

    #[tokio::test]
    async fn test_rejection_leaves_accounts_empty() {
        let wallet = ScriptedWallet::new(Err(4001), vec![accounts(&["0xaaa"])]);
        let connector = WalletConnector::mount(wallet, Duration::from_secs(1)).await;
        assert!(connector.accounts().is_empty());
        assert!(!connector.is_subscribed());
    }

    #[tokio::test]
    async fn test_static_wallet_mount() {
        let wallet = Arc::new(StaticWallet::new("0xaaa"));
        let connector = WalletConnector::mount(wallet, Duration::from_secs(1)).await;
        assert_eq!(connector.active_account().as_deref(), Some("0xaaa"));
        assert!(connector.is_subscribed());
    }

    #[tokio::test]
    async fn test_notification_overwrites_list() {
        let connector = WalletConnector::disconnected();
        let rx = connector.watch();
        connector.notify_accounts_changed(accounts(&["0x1", "0x2"]));
        assert_eq!(*rx.borrow(), accounts(&["0x1", "0x2"]));
        connector.notify_accounts_changed(accounts(&["0x3"]));
        assert_eq!(connector.active_account().as_deref(), Some("0x3"));
        assert_eq!(connector.accounts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_picks_up_account_change() {
        let wallet = ScriptedWallet::new(
            Ok(accounts(&["0xaaa"])),
            vec![accounts(&["0xaaa"]), accounts(&["0xbbb"])],
        );
        let connector = WalletConnector::mount(wallet, Duration::from_secs(2)).await;
        let mut rx = connector.watch();
        assert_eq!(connector.active_account().as_deref(), Some("0xaaa"));

        tokio::time::timeout(Duration::from_secs(30), rx.changed())
            .await
            .expect("account change within timeout")
            .unwrap();
        assert_eq!(connector.active_account().as_deref(), Some("0xbbb"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_polling() {
        let wallet = ScriptedWallet::new(Ok(accounts(&["0xaaa"])), vec![accounts(&["0xaaa"])]);
        let mut connector =
            WalletConnector::mount(wallet.clone(), Duration::from_secs(1)).await;

        tokio::time::sleep(Duration::from_millis(3500)).await;
        connector.unmount();
        assert!(!connector.is_subscribed());
        // let the aborted task observe cancellation
        tokio::task::yield_now().await;
        let polls_at_unmount = wallet.poll_count.load(Ordering::SeqCst);
        assert!(polls_at_unmount >= 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(wallet.poll_count.load(Ordering::SeqCst), polls_at_unmount);
        assert_eq!(connector.active_account().as_deref(), Some("0xaaa"));
    }
}
