//! Application router configuration.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};

use crate::{
    AppState, Error,
    bank::{create_bank_endpoint, get_banks_endpoint, rename_bank_endpoint, set_bank_active_endpoint},
    card::{
        create_card_endpoint, delete_card_detail_endpoint, delete_card_endpoint,
        get_card_detail_endpoint, get_cards_endpoint, update_card_endpoint,
        upsert_card_detail_endpoint,
    },
    concept::{create_concept_endpoint, get_concepts_endpoint, set_concept_active_endpoint},
    endpoints,
    expense::{
        clone_recurring_expenses_endpoint, create_expense_endpoint, delete_expense_detail_endpoint,
        delete_expense_endpoint, get_expense_detail_endpoint, get_expense_payments_endpoint,
        get_expense_summary_endpoint, get_expenses_endpoint, pay_expense_endpoint,
        undo_expense_payment_endpoint, update_expense_endpoint, upsert_expense_detail_endpoint,
    },
    loan::{
        close_loan_endpoint, create_loan_endpoint, delete_loan_detail_endpoint,
        delete_loan_endpoint, get_loan_detail_endpoint, get_loan_payments_endpoint,
        get_loan_summary_endpoint, get_loans_endpoint, pay_loan_endpoint,
        undo_loan_payment_endpoint, update_loan_endpoint, upsert_loan_detail_endpoint,
    },
    payment_method::{
        create_payment_method_endpoint, get_payment_methods_endpoint,
        update_payment_method_endpoint,
    },
    response::{ApiResult, acknowledged},
    statement::{
        create_statement_endpoint, delete_statement_detail_endpoint, delete_statement_endpoint,
        get_statement_detail_endpoint, get_statements_endpoint, pay_statement_endpoint,
        undo_statement_payment_endpoint, update_statement_endpoint,
        upsert_statement_detail_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let loan_routes = Router::new()
        .route(
            endpoints::LOANS,
            get(get_loans_endpoint).post(create_loan_endpoint),
        )
        .route(endpoints::LOAN_SUMMARY, get(get_loan_summary_endpoint))
        .route(
            endpoints::LOAN,
            put(update_loan_endpoint).delete(delete_loan_endpoint),
        )
        .route(
            endpoints::LOAN_PAY,
            post(pay_loan_endpoint).put(pay_loan_endpoint),
        )
        .route(endpoints::LOAN_UNDO, post(undo_loan_payment_endpoint))
        .route(endpoints::LOAN_PAYMENTS, get(get_loan_payments_endpoint))
        .route(endpoints::LOAN_CLOSE, post(close_loan_endpoint))
        .route(
            endpoints::LOAN_DETAIL,
            get(get_loan_detail_endpoint)
                .put(upsert_loan_detail_endpoint)
                .delete(delete_loan_detail_endpoint),
        );

    let card_routes = Router::new()
        .route(
            endpoints::CARDS,
            get(get_cards_endpoint).post(create_card_endpoint),
        )
        .route(
            endpoints::CARD,
            put(update_card_endpoint).delete(delete_card_endpoint),
        )
        .route(
            endpoints::CARD_DETAIL,
            get(get_card_detail_endpoint)
                .put(upsert_card_detail_endpoint)
                .delete(delete_card_detail_endpoint),
        );

    let expense_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(get_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE_SUMMARY, get(get_expense_summary_endpoint))
        .route(
            endpoints::EXPENSE_CLONE_RECURRING,
            post(clone_recurring_expenses_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            put(update_expense_endpoint).delete(delete_expense_endpoint),
        )
        .route(endpoints::EXPENSE_PAY, post(pay_expense_endpoint))
        .route(endpoints::EXPENSE_UNDO, post(undo_expense_payment_endpoint))
        .route(
            endpoints::EXPENSE_PAYMENTS,
            get(get_expense_payments_endpoint),
        )
        .route(
            endpoints::EXPENSE_DETAIL,
            get(get_expense_detail_endpoint)
                .put(upsert_expense_detail_endpoint)
                .delete(delete_expense_detail_endpoint),
        );

    let statement_routes = Router::new()
        .route(
            endpoints::STATEMENTS,
            get(get_statements_endpoint).post(create_statement_endpoint),
        )
        .route(
            endpoints::STATEMENT,
            put(update_statement_endpoint).delete(delete_statement_endpoint),
        )
        .route(endpoints::STATEMENT_PAY, post(pay_statement_endpoint))
        .route(
            endpoints::STATEMENT_UNDO,
            post(undo_statement_payment_endpoint),
        )
        .route(
            endpoints::STATEMENT_DETAIL,
            get(get_statement_detail_endpoint)
                .put(upsert_statement_detail_endpoint)
                .delete(delete_statement_detail_endpoint),
        );

    let catalog_routes = Router::new()
        .route(
            endpoints::BANKS,
            get(get_banks_endpoint).post(create_bank_endpoint),
        )
        .route(endpoints::BANK, patch(rename_bank_endpoint))
        .route(endpoints::BANK_ACTIVE, patch(set_bank_active_endpoint))
        .route(
            endpoints::CONCEPTS,
            get(get_concepts_endpoint).post(create_concept_endpoint),
        )
        .route(endpoints::CONCEPT_ACTIVE, put(set_concept_active_endpoint))
        .route(
            endpoints::PAYMENT_METHODS,
            get(get_payment_methods_endpoint).post(create_payment_method_endpoint),
        )
        .route(
            endpoints::PAYMENT_METHOD,
            put(update_payment_method_endpoint),
        );

    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .merge(loan_routes)
        .merge(card_routes)
        .merge(expense_routes)
        .merge(statement_routes)
        .merge(catalog_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_health() -> ApiResult<()> {
    Ok(acknowledged())
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
