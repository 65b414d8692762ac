use serde::{Deserialize, Serialize};

/// Commission applied when a credit type has no entry in the rate table.
pub const FALLBACK_COMMISSION_RATE: u8 = 30;

/// Icon shown next to a credit type. Resolved once when the catalog is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditIcon {
    Home,
    Wrench,
    Cpu,
    Receipt,
    Building,
}

/// Fiscal-credit product offered by the brokerage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditType {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: CreditIcon,
    pub percentage_range: &'static str,
    pub max_amount: &'static str,
    pub deadline: &'static str,
    pub requirements: Vec<&'static str>,
}

/// Document category a request can carry an upload for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Identity,
    Company,
    Tax,
    Technical,
    Conformity,
    Invoices,
    Permits,
    Energy,
    Certificates,
    Interconnection,
    Balance,
    Contract,
    Certification,
}

impl DocumentCategory {
    pub const fn key(self) -> &'static str {
        match self {
            DocumentCategory::Identity => "identity",
            DocumentCategory::Company => "company",
            DocumentCategory::Tax => "tax",
            DocumentCategory::Technical => "technical",
            DocumentCategory::Conformity => "conformity",
            DocumentCategory::Invoices => "invoices",
            DocumentCategory::Permits => "permits",
            DocumentCategory::Energy => "energy",
            DocumentCategory::Certificates => "certificates",
            DocumentCategory::Interconnection => "interconnection",
            DocumentCategory::Balance => "balance",
            DocumentCategory::Contract => "contract",
            DocumentCategory::Certification => "certification",
        }
    }
}

/// Entry of the per-type document checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredDocumentSpec {
    pub category: DocumentCategory,
    pub display_name: &'static str,
    pub required: bool,
}

const fn doc(
    category: DocumentCategory,
    display_name: &'static str,
    required: bool,
) -> RequiredDocumentSpec {
    RequiredDocumentSpec {
        category,
        display_name,
        required,
    }
}

const COMMON_DOCUMENTS: [RequiredDocumentSpec; 3] = [
    doc(DocumentCategory::Identity, "Documento di identità", true),
    doc(DocumentCategory::Company, "Visura camerale", true),
    doc(DocumentCategory::Tax, "Codice fiscale/P.IVA", true),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("credit type '{0}' not found")]
    NotFound(String),
}

/// Read-only registry of the credit products and their reference tables.
#[derive(Debug, Clone)]
pub struct CreditCatalog {
    credits: Vec<CreditType>,
}

impl CreditCatalog {
    pub fn standard() -> Self {
        Self {
            credits: vec![
                CreditType {
                    id: "superbonus",
                    name: "Superbonus 110%",
                    description: "Detrazione fiscale per interventi di efficientamento energetico e antisismici",
                    icon: CreditIcon::Home,
                    percentage_range: "110%",
                    max_amount: "Nessun limite",
                    deadline: "31 Dicembre 2025",
                    requirements: vec![
                        "Interventi su condomini o edifici da 2-4 unità",
                        "Miglioramento di almeno 2 classi energetiche",
                        "Asseverazione tecnica obbligatoria",
                    ],
                },
                CreditType {
                    id: "bonus-edilizi",
                    name: "Bonus Edilizi",
                    description: "Detrazioni per ristrutturazioni, ecobonus e bonus facciate",
                    icon: CreditIcon::Wrench,
                    percentage_range: "50-90%",
                    max_amount: "Varia per tipologia",
                    deadline: "31 Dicembre 2024",
                    requirements: vec![
                        "Interventi di ristrutturazione edilizia",
                        "Miglioramento efficienza energetica",
                        "Documentazione completa",
                    ],
                },
                CreditType {
                    id: "crediti-4-0",
                    name: "Crediti Industria 4.0",
                    description: "Credito d'imposta per investimenti in beni strumentali tecnologici",
                    icon: CreditIcon::Cpu,
                    percentage_range: "10-50%",
                    max_amount: "20 milioni €",
                    deadline: "31 Dicembre 2024",
                    requirements: vec![
                        "Acquisto beni strumentali 4.0",
                        "Interconnessione e controllo",
                        "Certificazione tecnica",
                    ],
                },
                CreditType {
                    id: "credito-iva",
                    name: "Credito IVA",
                    description: "Recupero e cessione crediti IVA maturati",
                    icon: CreditIcon::Receipt,
                    percentage_range: "Valore nominale",
                    max_amount: "Secondo credito",
                    deadline: "Sempre attivo",
                    requirements: vec![
                        "Credito IVA certificato",
                        "Dichiarazione IVA regolare",
                        "Documentazione fiscale",
                    ],
                },
                CreditType {
                    id: "credito-pa",
                    name: "Crediti P.A.",
                    description: "Crediti verso la Pubblica Amministrazione",
                    icon: CreditIcon::Building,
                    percentage_range: "Valore nominale",
                    max_amount: "Secondo credito",
                    deadline: "Sempre attivo",
                    requirements: vec![
                        "Credito verso ente pubblico",
                        "Certificazione debito",
                        "Documentazione contrattuale",
                    ],
                },
            ],
        }
    }

    pub fn all(&self) -> &[CreditType] {
        &self.credits
    }

    pub fn get(&self, id: &str) -> Result<&CreditType, CatalogError> {
        self.credits
            .iter()
            .find(|credit| credit.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    /// Commission percentage for the credit type, if the rate table lists it.
    pub fn commission_rate(&self, id: &str) -> Option<u8> {
        let rate = match id {
            "superbonus" => 13,
            "bonus-edilizi" => 15,
            "crediti-4-0" => 20,
            "credito-iva" => 25,
            "credito-pa" => 22,
            _ => return None,
        };
        Some(rate)
    }

    /// Ordered checklist for the credit type. Unknown types only get the common documents.
    ///
    /// A type-specific entry whose category already appears in the common list takes
    /// that entry's place, so every category occurs at most once.
    pub fn required_documents(&self, id: &str) -> Vec<RequiredDocumentSpec> {
        use DocumentCategory::*;

        let specific: &[RequiredDocumentSpec] = match id {
            "superbonus" => &[
                doc(Technical, "Asseverazione tecnica", true),
                doc(Conformity, "Visto di conformità", true),
                doc(Invoices, "Fatture degli interventi", true),
                doc(Permits, "Titoli abilitativi", false),
                doc(Energy, "APE ante e post intervento", true),
            ],
            "bonus-edilizi" => &[
                doc(Technical, "Asseverazione tecnica", true),
                doc(Conformity, "Visto di conformità", true),
                doc(Invoices, "Fatture e ricevute", true),
                doc(Permits, "Permessi/SCIA", false),
            ],
            "crediti-4-0" => &[
                doc(Technical, "Perizia tecnica", true),
                doc(Invoices, "Fatture di acquisto", true),
                doc(Certificates, "Certificati di conformità", true),
                doc(Interconnection, "Dichiarazione di interconnessione", false),
            ],
            "credito-iva" => &[
                doc(Tax, "Dichiarazione IVA", true),
                doc(Balance, "Bilancio aziendale", true),
                doc(Invoices, "Fatture di riferimento", true),
            ],
            "credito-pa" => &[
                doc(Contract, "Contratto con P.A.", true),
                doc(Invoices, "Fatture emesse", true),
                doc(Certification, "Certificato di credito", true),
            ],
            _ => &[],
        };

        let mut documents = COMMON_DOCUMENTS.to_vec();
        for entry in specific {
            match documents
                .iter_mut()
                .find(|existing| existing.category == entry.category)
            {
                Some(existing) => *existing = *entry,
                None => documents.push(*entry),
            }
        }
        documents
    }

    pub fn intervention_types(&self, id: &str) -> &'static [&'static str] {
        match id {
            "superbonus" => &[
                "Isolamento termico (cappotto)",
                "Sostituzione impianti di climatizzazione",
                "Interventi antisismici",
                "Installazione impianti fotovoltaici",
                "Installazione colonnine di ricarica",
            ],
            "bonus-edilizi" => &[
                "Ristrutturazione edilizia",
                "Efficientamento energetico",
                "Bonus facciate",
                "Bonus verde",
                "Bonus mobili",
            ],
            "crediti-4-0" => &[
                "Beni strumentali materiali",
                "Beni strumentali immateriali (software)",
                "Formazione 4.0",
                "Ricerca e sviluppo",
            ],
            _ => &[],
        }
    }
}

impl Default for CreditCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
