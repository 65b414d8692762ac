use crate::infra::{parse_amount_arg, InMemoryNotificationPublisher, InMemoryRequestRepository};
use async_trait::async_trait;
use chrono::Local;
use clap::Args;
use creditly::config::AppConfig;
use creditly::error::AppError;
use creditly::telemetry;
use creditly::workflows::credit::intake::{
    CreditRequestService, RepositoryError, RequestServiceError,
};
use creditly::workflows::credit::{
    CompanyFields, ConsentKey, CreditCatalog, DocumentArtifact, DraftStore, EvaluationResult,
    FileDraftStore, HttpRequestSubmitter, RateSource, RequestSubmitter, RequestWizard,
    SessionContext, SubmissionBoundary, SubmissionError, SubmissionReceipt, SubmissionRecord,
    ValuationCalculator, WizardStep,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Credit type id, e.g. `superbonus` or `credito-iva`
    #[arg(long)]
    pub(crate) credit: String,
    /// Nominal amount in euros (`100000`, `1.234,56`, `€ 5000`)
    #[arg(long, value_parser = parse_amount_arg)]
    pub(crate) amount: f64,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Credit type to request
    #[arg(long, default_value = "superbonus")]
    pub(crate) credit: String,
    /// Nominal amount as typed in the form
    #[arg(long, default_value = "100000")]
    pub(crate) amount: String,
    /// Session identifier; a draft left by a failed run under this id is resumed (random when omitted)
    #[arg(long)]
    pub(crate) session: Option<String>,
    /// Post the request to the configured submission endpoint instead of an in-process intake
    #[arg(long)]
    pub(crate) remote: bool,
}

pub(crate) fn run_catalog() -> Result<(), AppError> {
    let catalog = CreditCatalog::standard();
    println!("Creditly Global credit catalog");
    for credit in catalog.all() {
        let rate = catalog
            .commission_rate(credit.id)
            .map(|rate| format!("{rate}%"))
            .unwrap_or_else(|| "n/a".to_string());
        println!();
        println!("{} ({})", credit.name, credit.id);
        println!("  {}", credit.description);
        println!(
            "  Detrazione: {} | Massimale: {} | Scadenza: {} | Commissione: {}",
            credit.percentage_range, credit.max_amount, credit.deadline, rate
        );
        println!("  Documenti:");
        for spec in catalog.required_documents(credit.id) {
            let marker = if spec.required { "" } else { " (facoltativo)" };
            println!("    - {}{}", spec.display_name, marker);
        }
        let interventions = catalog.intervention_types(credit.id);
        if !interventions.is_empty() {
            println!("  Interventi: {}", interventions.join(", "));
        }
    }
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let calculator = ValuationCalculator::new(CreditCatalog::standard());
    let result = calculator.evaluate(&args.credit, args.amount)?;
    render_evaluation(&result);
    Ok(())
}

fn render_evaluation(result: &EvaluationResult) {
    println!("Valutazione per {}", result.credit_type);
    println!("  Importo nominale:   €{}", result.nominal_amount);
    println!("  Valore di cessione: €{}", result.sale_value);
    println!(
        "  Commissione ({}%):  €{}",
        result.commission_rate, result.commission
    );
    println!("  Netto al cedente:   €{}", result.net_amount);
    if result.rate_source == RateSource::Fallback {
        println!("  (tipo di credito non in listino: commissione standard applicata)");
    }
}

type LocalService = CreditRequestService<InMemoryRequestRepository, InMemoryNotificationPublisher>;

/// Submits straight into an in-process intake service.
struct LocalSubmitter {
    service: Arc<LocalService>,
}

#[async_trait]
impl RequestSubmitter for LocalSubmitter {
    async fn submit(
        &self,
        record: &SubmissionRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.service
            .submit(record.clone())
            .map(|request| request.receipt())
            .map_err(submission_error)
    }
}

/// Same classification the HTTP surface produces: storage outages stay retryable.
fn submission_error(err: RequestServiceError) -> SubmissionError {
    let status = match &err {
        RequestServiceError::Validation(_) => 422,
        RequestServiceError::FinalStatus { .. }
        | RequestServiceError::Repository(RepositoryError::Conflict) => 409,
        RequestServiceError::Repository(RepositoryError::NotFound) => 404,
        RequestServiceError::Repository(RepositoryError::Unavailable(_))
        | RequestServiceError::Notification(_) => {
            return SubmissionError::Retryable(err.to_string())
        }
    };
    SubmissionError::Rejected {
        status,
        message: err.to_string(),
    }
}

fn sample_company() -> CompanyFields {
    CompanyFields {
        company_name: "Condominio Via Roma 12".to_string(),
        vat_number: "IT01234567890".to_string(),
        fiscal_code: "97012345678".to_string(),
        legal_representative: "Mario Rossi".to_string(),
        email: "amministrazione@condominioviaroma.it".to_string(),
        phone: "+39 02 1234567".to_string(),
    }
}

fn fill_data_entry(wizard: &mut RequestWizard, amount: &str) -> Result<(), AppError> {
    println!("\n[1/4] Dati Richiesta");
    if !wizard.can_proceed() {
        wizard.set_company(sample_company());
        wizard.set_amount(amount);
        if let Some(first) = wizard.intervention_types().first() {
            wizard.set_intervention_type(Some(first.to_string()))?;
        }
    }
    if let Some(evaluation) = wizard.evaluation() {
        render_evaluation(&evaluation);
    }
    Ok(())
}

fn upload_documents(wizard: &mut RequestWizard) -> Result<(), AppError> {
    println!("\n[2/4] Documenti");
    let missing: Vec<_> = wizard
        .checklist()
        .missing_required()
        .into_iter()
        .copied()
        .collect();
    for spec in missing {
        let artifact = DocumentArtifact {
            name: format!("{}.pdf", spec.category.key()),
            uri: format!("file:///demo/{}.pdf", spec.category.key()),
            mime_type: Some("application/pdf".to_string()),
            size_bytes: 64_000,
        };
        wizard.upload_document(spec.category, artifact)?;
        println!("  caricato: {}", spec.display_name);
    }
    let status = wizard.document_status();
    println!(
        "  completati {}/{} documenti obbligatori",
        status.completed_required, status.total_required
    );
    Ok(())
}

fn grant_consents(wizard: &mut RequestWizard) {
    println!("\n[3/4] Privacy & Consensi");
    for key in [ConsentKey::Privacy, ConsentKey::AntiMoney, ConsentKey::Terms] {
        if !wizard.consents().get(key) {
            wizard.set_consent(key, true);
        }
        println!("  accettato: {}", key.label());
    }
}

fn sign_contract(wizard: &mut RequestWizard) {
    println!("\n[4/4] Firma Digitale");
    for line in wizard.contract_summary() {
        println!("  {}: {}", line.label, line.value);
    }
    println!();
    println!("{}", wizard.contract_text(Local::now().date_naive()));
    if !wizard.can_proceed() {
        wizard.sign("data:image/png;base64,ZGVtby1zaWduYXR1cmU=");
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let catalog = CreditCatalog::standard();
    let drafts = Arc::new(FileDraftStore::new(config.drafts.dir.clone()));
    let session_id = args
        .session
        .unwrap_or_else(|| format!("demo-{}", uuid::Uuid::new_v4().simple()));
    let session = SessionContext::anonymous(&session_id);

    let mut wizard = match drafts.load(&session_id)? {
        Some(snapshot) => {
            println!("Bozza {} ripresa dal passo {}", session_id, snapshot.step);
            RequestWizard::resume(&catalog, session, snapshot)?
        }
        None => RequestWizard::open(&catalog, &args.credit, session)?,
    };
    println!("Richiesta {} per {}", session_id, wizard.credit().name);

    loop {
        match wizard.step() {
            WizardStep::DataEntry => fill_data_entry(&mut wizard, &args.amount)?,
            WizardStep::Documents => upload_documents(&mut wizard)?,
            WizardStep::Consents => grant_consents(&mut wizard),
            WizardStep::Signature => {
                sign_contract(&mut wizard);
                break;
            }
        }
        wizard.next()?;
    }

    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let local_service = Arc::new(CreditRequestService::new(
        catalog,
        Arc::new(InMemoryRequestRepository::default()),
        notifications.clone(),
    ));
    let submitter: Arc<dyn RequestSubmitter> = if args.remote {
        println!("Invio a {}", config.submission.endpoint);
        Arc::new(HttpRequestSubmitter::new(
            config.submission.endpoint.clone(),
            config.submission.timeout,
        )?)
    } else {
        Arc::new(LocalSubmitter {
            service: local_service,
        })
    };
    let boundary = SubmissionBoundary::new(submitter, drafts.clone())
        .with_timeout(config.submission.timeout);

    match wizard.submit(&boundary).await {
        Ok(receipt) => {
            println!(
                "\nRichiesta inviata: {} (stato: {})",
                receipt.request_id, receipt.status
            );
            for event in notifications.events() {
                println!("  notifica: {} ({})", event.template, event.reference);
            }
            Ok(())
        }
        Err(failure) => {
            println!(
                "\nInvio non riuscito, bozza salvata in {} (passo {}); rilancia con --session {} per riprenderla",
                drafts.dir().display(),
                failure.wizard.step(),
                session_id
            );
            Err(failure.error.into())
        }
    }
}
