//! Contract summary shown on the signature step.
//!
//! Rendering is best effort: any field the user has not filled in yet is shown
//! as a bracketed placeholder so the signature step always has something to show.

use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::CreditType;
use super::domain::RequestDraft;
use super::valuation::EvaluationResult;

/// Party receiving the ceded credit.
pub const ASSIGNEE: &str = "Creditly Global";
const SIGNING_PLACE: &str = "Dubai";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSummaryLine {
    pub label: &'static str,
    pub value: String,
}

pub fn render(credit: Option<&CreditType>, draft: &RequestDraft, date: NaiveDate) -> String {
    let date = date.format("%d/%m/%Y");
    let representative = or_placeholder(&draft.company.legal_representative, "[Nome]");
    let company = or_placeholder(&draft.company.company_name, "[Ragione Sociale]");
    let vat_number = or_placeholder(&draft.company.vat_number, "[P.IVA]");
    let credit_name = credit.map(|credit| credit.name).unwrap_or("[Tipo Credito]");
    let amount = or_placeholder(&draft.amount, "[Importo]");

    format!(
        "CONTRATTO DI CESSIONE CREDITO FISCALE

Data: {date}

Il sottoscritto {representative}, in qualità di legale rappresentante di {company}, con sede legale in [Indirizzo], Codice Fiscale/P.IVA {vat_number},

DICHIARA

di voler cedere a {ASSIGNEE} il credito fiscale derivante da {credit_name} per un importo nominale di €{amount}.

ACCETTA

- Le condizioni economiche proposte
- I termini e le modalità di cessione
- Le tempistiche di pagamento concordate
- Le clausole di garanzia e responsabilità

AUTORIZZA

{ASSIGNEE} a procedere con tutte le pratiche necessarie per la cessione del credito presso l'Agenzia delle Entrate e gli enti competenti.

Il presente contratto è regolato dalla normativa italiana vigente in materia di cessione dei crediti fiscali.

Luogo e data: {SIGNING_PLACE}, {date}

Firma digitale del Cedente:
"
    )
}

/// Key figures listed above the contract text.
pub fn summary(
    credit: Option<&CreditType>,
    draft: &RequestDraft,
    evaluation: Option<&EvaluationResult>,
) -> Vec<ContractSummaryLine> {
    vec![
        ContractSummaryLine {
            label: "Tipo di credito",
            value: credit
                .map(|credit| credit.name.to_string())
                .unwrap_or_else(|| "[Tipo Credito]".to_string()),
        },
        ContractSummaryLine {
            label: "Importo nominale",
            value: format!("€{}", or_placeholder(&draft.amount, "[Importo]")),
        },
        ContractSummaryLine {
            label: "Valore di cessione",
            value: evaluation
                .map(|result| format!("€{}", result.sale_value))
                .unwrap_or_else(|| "[Valore]".to_string()),
        },
        ContractSummaryLine {
            label: "Azienda",
            value: or_placeholder(&draft.company.company_name, "[Ragione Sociale]").to_string(),
        },
        ContractSummaryLine {
            label: "Rappresentante",
            value: or_placeholder(&draft.company.legal_representative, "[Nome]").to_string(),
        },
    ]
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}
