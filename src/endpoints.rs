//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/loans/{loan_id}', use [format_endpoint].

/// Reports that the server is up.
pub const HEALTH: &str = "/api/health";

/// The route to list and create loans.
pub const LOANS: &str = "/api/loans";
/// The route for the loan totals of a month.
pub const LOAN_SUMMARY: &str = "/api/loans/summary";
/// The route to update or delete a loan.
pub const LOAN: &str = "/api/loans/{loan_id}";
/// The route to pay the installment of a loan for a month.
pub const LOAN_PAY: &str = "/api/loans/{loan_id}/pay";
/// The route to remove the latest payment of a loan.
pub const LOAN_UNDO: &str = "/api/loans/{loan_id}/undo";
/// The route to list the payments of a loan.
pub const LOAN_PAYMENTS: &str = "/api/loans/{loan_id}/payments";
/// The route to pay off a loan early.
pub const LOAN_CLOSE: &str = "/api/loans/{loan_id}/close";
/// The route for the contract details of a loan.
pub const LOAN_DETAIL: &str = "/api/loans/{loan_id}/detail";

/// The route to list and create cards.
pub const CARDS: &str = "/api/cards";
/// The route to update or deactivate a card.
pub const CARD: &str = "/api/cards/{card_id}";
/// The route for the details of a card.
pub const CARD_DETAIL: &str = "/api/cards/{card_id}/detail";

/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route for the monthly and yearly expense totals.
pub const EXPENSE_SUMMARY: &str = "/api/expenses/summary";
/// The route to copy last month's recurring expenses.
pub const EXPENSE_CLONE_RECURRING: &str = "/api/expenses/recurring/clone";
/// The route to update or delete an expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to pay an expense.
pub const EXPENSE_PAY: &str = "/api/expenses/{expense_id}/pay";
/// The route to remove the latest payment of an expense.
pub const EXPENSE_UNDO: &str = "/api/expenses/{expense_id}/undo";
/// The route to list the payments of an expense.
pub const EXPENSE_PAYMENTS: &str = "/api/expenses/{expense_id}/payments";
/// The route for the receipt details of an expense.
pub const EXPENSE_DETAIL: &str = "/api/expenses/{expense_id}/detail";

/// The route to list and create card statements.
pub const STATEMENTS: &str = "/api/statements";
/// The route to update or delete a statement.
pub const STATEMENT: &str = "/api/statements/{statement_id}";
/// The route to pay a statement.
pub const STATEMENT_PAY: &str = "/api/statements/{statement_id}/pay";
/// The route to undo the payment of a statement.
pub const STATEMENT_UNDO: &str = "/api/statements/{statement_id}/undo";
/// The route for the details of a statement.
pub const STATEMENT_DETAIL: &str = "/api/statements/{statement_id}/detail";

/// The route to list and create banks.
pub const BANKS: &str = "/api/banks";
/// The route to rename a bank.
pub const BANK: &str = "/api/banks/{bank_id}";
/// The route to activate or deactivate a bank.
pub const BANK_ACTIVE: &str = "/api/banks/{bank_id}/active";

/// The route to list and create concepts.
pub const CONCEPTS: &str = "/api/concepts";
/// The route to activate or deactivate a concept.
pub const CONCEPT_ACTIVE: &str = "/api/concepts/{concept_id}/active";

/// The route to list and create payment methods.
pub const PAYMENT_METHODS: &str = "/api/payment-methods";
/// The route to update a payment method.
pub const PAYMENT_METHOD: &str = "/api/payment-methods/{payment_method_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/loans/{loan_id}', '{loan_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
