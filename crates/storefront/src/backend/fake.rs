//! In-memory [`OrderingBackend`] for tests.
//!
//! Every operation returns a configurable canned reply and records how often
//! it was called, so tests can assert that a code path never reached the
//! network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use hfc_core::menu::{Category, MenuItem, Promotion};
use hfc_core::messages::{ChatReply, ChatRequest, ChatThread};
use hfc_core::orders::OrderRecord;
use hfc_core::{PaymentOutcome, TransactionId};

use super::{
    BackendError, BackendUser, BearerToken, CheckoutLine, ContactOwnerReceipt,
    InitiatePaymentResponse, OrderingBackend,
};

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub initiate_payment: AtomicUsize,
    pub payment_status: AtomicUsize,
    pub my_orders: AtomicUsize,
    pub sync_user: AtomicUsize,
    pub contact_owner: AtomicUsize,
    pub ask_assistant: AtomicUsize,
}

impl CallCounts {
    #[must_use]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Scriptable fake backend.
#[derive(Debug)]
pub struct FakeBackend {
    pub calls: CallCounts,
    categories: Mutex<Result<Vec<Category>, BackendError>>,
    menu_items: Mutex<Result<Vec<MenuItem>, BackendError>>,
    promotions: Mutex<Result<Vec<Promotion>, BackendError>>,
    assistant: Mutex<Result<ChatReply, BackendError>>,
    user: Mutex<Result<Option<BackendUser>, BackendError>>,
    initiate: Mutex<Result<InitiatePaymentResponse, BackendError>>,
    initiate_delay: Mutex<Duration>,
    status: Mutex<Vec<Result<PaymentOutcome, BackendError>>>,
    orders: Mutex<Result<Vec<OrderRecord>, BackendError>>,
    contact: Mutex<Result<ContactOwnerReceipt, BackendError>>,
    messages: Mutex<Result<Vec<ChatThread>, BackendError>>,
    /// Last cart lines submitted to `initiate_payment`.
    pub submitted_lines: Mutex<Vec<CheckoutLine>>,
    /// Last transaction id queried.
    pub queried_transaction: Mutex<Option<TransactionId>>,
    /// Last chat request received.
    pub last_chat: Mutex<Option<ChatRequest>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: CallCounts::default(),
            categories: Mutex::new(Ok(Vec::new())),
            menu_items: Mutex::new(Ok(Vec::new())),
            promotions: Mutex::new(Ok(Vec::new())),
            assistant: Mutex::new(Ok(ChatReply {
                answer: "Try the dal makhani!".to_string(),
            })),
            user: Mutex::new(Ok(None)),
            initiate: Mutex::new(Err(BackendError::Unreachable("not scripted".into()))),
            initiate_delay: Mutex::new(Duration::ZERO),
            status: Mutex::new(Vec::new()),
            orders: Mutex::new(Ok(Vec::new())),
            contact: Mutex::new(Ok(ContactOwnerReceipt {
                status: "success".to_string(),
                message: "Your message has been sent.".to_string(),
            })),
            messages: Mutex::new(Ok(Vec::new())),
            submitted_lines: Mutex::new(Vec::new()),
            queried_transaction: Mutex::new(None),
            last_chat: Mutex::new(None),
        }
    }
}

fn set<T>(slot: &Mutex<T>, value: T) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

fn get<T: Clone>(slot: &Mutex<T>) -> T {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_menu(self, categories: Vec<Category>, items: Vec<MenuItem>) -> Self {
        set(&self.categories, Ok(categories));
        set(&self.menu_items, Ok(items));
        self
    }

    #[must_use]
    pub fn with_promotions(self, promotions: Vec<Promotion>) -> Self {
        set(&self.promotions, Ok(promotions));
        self
    }

    #[must_use]
    pub fn with_user(self, user: Option<BackendUser>) -> Self {
        set(&self.user, Ok(user));
        self
    }

    #[must_use]
    pub fn with_orders(self, orders: Result<Vec<OrderRecord>, BackendError>) -> Self {
        set(&self.orders, orders);
        self
    }

    #[must_use]
    pub fn with_messages(self, messages: Result<Vec<ChatThread>, BackendError>) -> Self {
        set(&self.messages, messages);
        self
    }

    #[must_use]
    pub fn with_assistant(self, reply: Result<ChatReply, BackendError>) -> Self {
        set(&self.assistant, reply);
        self
    }

    #[must_use]
    pub fn with_contact(self, reply: Result<ContactOwnerReceipt, BackendError>) -> Self {
        set(&self.contact, reply);
        self
    }

    /// Script the reply to `initiate_payment`.
    pub fn set_initiate(&self, reply: Result<InitiatePaymentResponse, BackendError>) {
        set(&self.initiate, reply);
    }

    /// Make `initiate_payment` take `delay` before answering.
    pub fn set_initiate_delay(&self, delay: Duration) {
        set(&self.initiate_delay, delay);
    }

    /// Script the replies to successive `payment_status` calls.
    ///
    /// The last reply repeats once the script runs out.
    pub fn set_status(&self, replies: Vec<Result<PaymentOutcome, BackendError>>) {
        set(&self.status, replies);
    }
}

#[async_trait]
impl OrderingBackend for FakeBackend {
    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        get(&self.categories)
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, BackendError> {
        get(&self.menu_items)
    }

    async fn list_promotions(&self) -> Result<Vec<Promotion>, BackendError> {
        get(&self.promotions)
    }

    async fn ask_assistant(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        bump(&self.calls.ask_assistant);
        set(&self.last_chat, Some(request.clone()));
        get(&self.assistant)
    }

    async fn sync_user(&self, _id_token: &BearerToken) -> Result<Option<BackendUser>, BackendError> {
        bump(&self.calls.sync_user);
        get(&self.user)
    }

    async fn initiate_payment(
        &self,
        _credential: &BearerToken,
        lines: &[CheckoutLine],
    ) -> Result<InitiatePaymentResponse, BackendError> {
        bump(&self.calls.initiate_payment);
        set(&self.submitted_lines, lines.to_vec());
        let delay = get(&self.initiate_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        get(&self.initiate)
    }

    async fn payment_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentOutcome, BackendError> {
        bump(&self.calls.payment_status);
        set(&self.queried_transaction, Some(transaction_id.clone()));
        let mut script = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        match script.len() {
            0 => Err(BackendError::Unreachable("not scripted".into())),
            1 => script.first().cloned().unwrap_or_else(|| {
                Err(BackendError::Unreachable("not scripted".into()))
            }),
            _ => script.remove(0),
        }
    }

    async fn my_orders(&self, _credential: &BearerToken) -> Result<Vec<OrderRecord>, BackendError> {
        bump(&self.calls.my_orders);
        get(&self.orders)
    }

    async fn contact_owner(
        &self,
        _credential: &BearerToken,
        _message: &str,
    ) -> Result<ContactOwnerReceipt, BackendError> {
        bump(&self.calls.contact_owner);
        get(&self.contact)
    }

    async fn my_messages(
        &self,
        _credential: &BearerToken,
    ) -> Result<Vec<ChatThread>, BackendError> {
        get(&self.messages)
    }
}
