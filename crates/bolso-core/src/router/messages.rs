//! Fixed reply texts

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::dates::format_br;
use crate::models::Expense;
use crate::report::format_amount;

pub const HELP_MESSAGE: &str = "🤖 MeuBolso.AI - Assistente Financeiro\n\n\
📝 Como usar:\n\
• \"gastei 50 no mercado\" - Registra despesa\n\
• \"relatório mês\" - Gera relatório mensal\n\
• \"quanto gastei hoje?\" - Consulta seus gastos\n\
• \"como está minha saúde financeira?\" - Análise financeira\n\
• \"ajuda\" - Mostra esta mensagem\n\n\
💡 Exemplos:\n\
• \"gastei 25 no uber\"\n\
• \"paguei 1200 de aluguel\"\n\
• \"comprei remédio por 45\"\n\
• \"gastei 30 no uber, gastei 50 no mercado\"";

pub const INVALID_EXPENSE: &str = "Não consegui entender a despesa. Tente: \"gastei 50 no mercado\"";
pub const EXPENSE_FAILURE: &str = "Erro ao registrar despesa.";
pub const NO_VALID_EXPENSES: &str = "Nenhuma despesa válida foi encontrada na mensagem.";
pub const REPORT_FAILURE: &str = "Não consegui gerar o relatório agora. Tente novamente em instantes.";
pub const QUESTION_FAILURE: &str = "Não consegui responder sua pergunta agora. Tente novamente em instantes.";

/// Lead-in sent before a question answer when no generated one is available
pub const QUESTION_LEAD_FALLBACK: &str = "Vou ajudar você com isso!";

pub const CONVERSATION_FALLBACK: &str = "Olá! Como posso ajudar você com suas finanças hoje? 😊";

const HELP_HINT: &str = "💡 Digite \"ajuda\" para ver os comandos disponíveis.";

/// Wrap a failure for the user, with the help hint
pub fn error_message(detail: &str) -> String {
    format!("❌ Erro: {}\n\n{}", detail, HELP_HINT)
}

pub fn expense_confirmation(expense: &Expense) -> String {
    confirmation_text(
        expense.amount,
        &expense.category_name,
        &expense.description,
        expense.date,
    )
}

fn confirmation_text(amount: f64, category: &str, description: &str, date: NaiveDate) -> String {
    format!(
        "✅ Despesa registrada com sucesso!\n\n💰 Valor: {}\n📂 Categoria: {}\n📝 Descrição: {}\n📅 Data: {}",
        format_amount(amount),
        category,
        description,
        format_br(date)
    )
}

/// One summary for a message that recorded several expenses
pub fn multi_expense_summary(expenses: &[Expense]) -> String {
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let mut out = format!(
        "✅ {} despesa(s) registrada(s) com sucesso!\n\n💰 Total: {}\n\n",
        expenses.len(),
        format_amount(total)
    );
    for (i, expense) in expenses.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {} ({})",
            i + 1,
            expense.description,
            format_amount(expense.amount),
            expense.category_name
        );
    }
    out.trim_end().to_string()
}
