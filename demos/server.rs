//! Simple REST API server example for the wallet ledger engine.
//!
//! Run with: `cargo run --example server`
//!
//! Caller identity comes from the `x-user-id` header; a real deployment
//! would authenticate the caller and derive the user id from the session.
//!
//! ## Endpoints
//!
//! - `POST /accounts` - Create an account (fixture surface; account CRUD is
//!   owned by the surrounding system in production)
//! - `GET /accounts` - List the caller's accounts
//! - `GET /accounts/{id}` - Get one account
//! - `POST /transactions` - Create a transaction (income, expense, transfer,
//!   debt-give, debt-take, debt-repay)
//! - `GET /transactions` - List the caller's transactions, newest first
//! - `PATCH /transactions/{id}` - Amend description/date/category
//! - `DELETE /transactions/{id}` - Delete a row (balances stay as committed)
//! - `GET /debts` - List the caller's active debts, newest first
//!
//! ## Example Usage
//!
//! ```bash
//! # Create an account
//! curl -X POST http://localhost:3000/accounts \
//!   -H "Content-Type: application/json" -H "x-user-id: 1" \
//!   -d '{"name": "Checking", "opening_balance": "0"}'
//!
//! # Record income
//! curl -X POST http://localhost:3000/transactions \
//!   -H "Content-Type: application/json" -H "x-user-id: 1" \
//!   -d '{"type": "income", "account_id": 1, "amount": "100.00", "date": "2025-06-01"}'
//!
//! # Lend money to Alex
//! curl -X POST http://localhost:3000/transactions \
//!   -H "Content-Type: application/json" -H "x-user-id: 1" \
//!   -d '{"type": "debt-give", "account_id": 1, "amount": "40.00", "date": "2025-06-02", "contact_name": "Alex"}'
//!
//! # Active debts
//! curl http://localhost:3000/debts -H "x-user-id: 1"
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wallet_ledger_rs::{
    Account, AccountId, CategoryId, DebtContact, DebtStatus, LedgerEngine, LedgerError,
    MemoryStore, NewTransaction, ProfileId, TransactionFilter, TransactionId, TransactionKind,
    TransactionPatch, TransactionRecord, UserId,
};

// === Request/Response DTOs ===

/// Request body for creating accounts.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub name: String,
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
}

/// Kind-specific part of a transaction request.
///
/// Tagged for clean JSON:
/// ```json
/// {"type": "transfer", "from_account_id": 1, "to_account_id": 2, "amount": "20.00", "date": "2025-06-01"}
/// ```
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KindRequest {
    Income {
        account_id: u64,
    },
    Expense {
        account_id: u64,
    },
    Transfer {
        from_account_id: u64,
        to_account_id: u64,
    },
    DebtGive {
        account_id: u64,
        contact_name: String,
        #[serde(default)]
        contact_phone: Option<String>,
    },
    DebtTake {
        account_id: u64,
        contact_name: String,
        #[serde(default)]
        contact_phone: Option<String>,
    },
    DebtRepay {
        account_id: u64,
        debt_id: u64,
    },
}

/// Request body for creating transactions.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(flatten)]
    pub kind: KindRequest,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub profile_id: Option<u64>,
}

impl TransactionRequest {
    /// Converts the request DTO into the engine's request type.
    fn into_new_transaction(self) -> NewTransaction {
        let kind = match self.kind {
            KindRequest::Income { account_id } => TransactionKind::Income {
                account_id: AccountId(account_id),
            },
            KindRequest::Expense { account_id } => TransactionKind::Expense {
                account_id: AccountId(account_id),
            },
            KindRequest::Transfer {
                from_account_id,
                to_account_id,
            } => TransactionKind::Transfer {
                from_account_id: AccountId(from_account_id),
                to_account_id: AccountId(to_account_id),
            },
            KindRequest::DebtGive {
                account_id,
                contact_name,
                contact_phone,
            } => TransactionKind::DebtGive {
                account_id: AccountId(account_id),
                contact: DebtContact {
                    name: contact_name,
                    phone: contact_phone,
                },
            },
            KindRequest::DebtTake {
                account_id,
                contact_name,
                contact_phone,
            } => TransactionKind::DebtTake {
                account_id: AccountId(account_id),
                contact: DebtContact {
                    name: contact_name,
                    phone: contact_phone,
                },
            },
            KindRequest::DebtRepay {
                account_id,
                debt_id,
            } => TransactionKind::DebtRepay {
                account_id: AccountId(account_id),
                debt_id: TransactionId(debt_id),
            },
        };
        NewTransaction {
            kind,
            amount: self.amount,
            date: self.date,
            description: self.description,
            category_id: self.category_id.map(CategoryId),
            profile_id: self.profile_id.map(ProfileId),
        }
    }
}

/// Request body for amending transactions.
#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub category_id: Option<u64>,
}

/// Response body for account information.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: u64,
    pub name: String,
    pub balance: Decimal,
    pub type_name: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            id: account.id.0,
            name: account.name,
            balance: account.balance,
            type_name: account.type_ref.map(|t| t.name),
        }
    }
}

/// Response body for transaction information.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub accounts: Vec<u64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category: Option<String>,
    pub debt_status: Option<DebtStatus>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        TransactionResponse {
            id: record.id.0,
            kind: record.kind.label(),
            accounts: record.kind.account_ids().iter().map(|id| id.0).collect(),
            amount: record.amount,
            date: record.date,
            description: record.description,
            category: record.category_name,
            debt_status: record.debt_status,
        }
    }
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LedgerEngine<MemoryStore>>,
}

// === Error Handling ===

/// Wrapper for converting engine errors into HTTP responses.
pub enum AppError {
    Ledger(LedgerError),
    MissingIdentity,
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Ledger(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Ledger(err) => {
                let (status, code) = match err {
                    LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
                    LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    LedgerError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    LedgerError::InvalidReference(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_REFERENCE")
                    }
                    LedgerError::Internal(_) => {
                        error!(error = %err, "internal failure");
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
                    }
                };
                (status, code, err.to_string())
            }
            AppError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "MISSING_IDENTITY",
                "missing or invalid x-user-id header".to_string(),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

/// Resolves the calling user from the `x-user-id` header.
fn caller(headers: &HeaderMap) -> Result<UserId, AppError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(UserId)
        .ok_or(AppError::MissingIdentity)
}

// === Handlers ===

/// POST /accounts - Create an account for the caller.
async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let user = caller(&headers)?;
    let account = state.engine.store().add_account(
        user,
        &request.name,
        request.opening_balance.unwrap_or(Decimal::ZERO),
        None,
    );
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /accounts - List the caller's accounts.
async fn list_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let user = caller(&headers)?;
    let accounts = state
        .engine
        .store()
        .accounts_for_user(user)
        .into_iter()
        .map(AccountResponse::from)
        .collect();
    Ok(Json(accounts))
}

/// GET /accounts/{id} - Get one account with an ownership check.
async fn get_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<AccountResponse>, AppError> {
    let user = caller(&headers)?;
    let account = state.engine.get_account(user, AccountId(id))?;
    Ok(Json(account.into()))
}

/// POST /transactions - Create a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let user = caller(&headers)?;
    let record = state
        .engine
        .create_transaction(user, request.into_new_transaction())?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /transactions - List the caller's transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let user = caller(&headers)?;
    let records = state
        .engine
        .list_transactions(&TransactionFilter::for_user(user))?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// PATCH /transactions/{id} - Amend description/date/category.
async fn update_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<PatchRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let user = caller(&headers)?;
    let patch = TransactionPatch {
        description: request.description,
        date: request.date,
        category_id: request.category_id.map(CategoryId),
    };
    let record = state
        .engine
        .update_transaction(user, TransactionId(id), patch)?;
    Ok(Json(record.into()))
}

/// DELETE /transactions/{id} - Delete a row; balances stay as committed.
async fn delete_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let user = caller(&headers)?;
    state.engine.delete_transaction(user, TransactionId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /debts - List the caller's active debts, newest first.
async fn list_active_debts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let user = caller(&headers)?;
    let records = state.engine.find_active_debts(user)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/transactions", post(create_transaction).get(list_transactions))
        .route(
            "/transactions/{id}",
            patch(update_transaction).delete(delete_transaction),
        )
        .route("/debts", get(list_active_debts))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let state = AppState {
        engine: Arc::new(LedgerEngine::new(MemoryStore::new())),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Wallet ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints (all require an x-user-id header):");
    println!("  POST   /accounts           - Create an account");
    println!("  GET    /accounts           - List accounts");
    println!("  GET    /accounts/{{id}}      - Get account by ID");
    println!("  POST   /transactions       - Create a transaction");
    println!("  GET    /transactions       - List transactions");
    println!("  PATCH  /transactions/{{id}}  - Amend a transaction");
    println!("  DELETE /transactions/{{id}}  - Delete a transaction");
    println!("  GET    /debts              - List active debts");

    axum::serve(listener, app).await.unwrap();
}
