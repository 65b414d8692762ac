use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsentKey {
    Privacy,
    Marketing,
    AntiMoney,
    Terms,
    Representation,
    DataVerification,
    EconomicTerms,
}

impl ConsentKey {
    pub const ALL: [ConsentKey; 7] = [
        ConsentKey::Privacy,
        ConsentKey::Marketing,
        ConsentKey::AntiMoney,
        ConsentKey::Terms,
        ConsentKey::Representation,
        ConsentKey::DataVerification,
        ConsentKey::EconomicTerms,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ConsentKey::Privacy => "privacy",
            ConsentKey::Marketing => "marketing",
            ConsentKey::AntiMoney => "antiMoney",
            ConsentKey::Terms => "terms",
            ConsentKey::Representation => "representation",
            ConsentKey::DataVerification => "dataVerification",
            ConsentKey::EconomicTerms => "economicTerms",
        }
    }

    /// Consents that gate progression past the consent step.
    pub const fn is_mandatory(self) -> bool {
        matches!(self, ConsentKey::Privacy | ConsentKey::AntiMoney)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsentSet {
    pub privacy: bool,
    pub marketing: bool,
    pub anti_money: bool,
    pub terms: bool,
    pub representation: bool,
    pub data_verification: bool,
    pub economic_terms: bool,
}

impl ConsentSet {
    pub fn get(&self, key: ConsentKey) -> bool {
        match key {
            ConsentKey::Privacy => self.privacy,
            ConsentKey::Marketing => self.marketing,
            ConsentKey::AntiMoney => self.anti_money,
            ConsentKey::Terms => self.terms,
            ConsentKey::Representation => self.representation,
            ConsentKey::DataVerification => self.data_verification,
            ConsentKey::EconomicTerms => self.economic_terms,
        }
    }

    fn slot(&mut self, key: ConsentKey) -> &mut bool {
        match key {
            ConsentKey::Privacy => &mut self.privacy,
            ConsentKey::Marketing => &mut self.marketing,
            ConsentKey::AntiMoney => &mut self.anti_money,
            ConsentKey::Terms => &mut self.terms,
            ConsentKey::Representation => &mut self.representation,
            ConsentKey::DataVerification => &mut self.data_verification,
            ConsentKey::EconomicTerms => &mut self.economic_terms,
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.privacy && self.anti_money
    }
}

/// Single consent toggle kept for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentChange {
    pub key: ConsentKey,
    pub value: bool,
    pub at: DateTime<Utc>,
}

/// Consent flags of a request plus the trail of every change applied to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentLedger {
    consents: ConsentSet,
    #[serde(default)]
    changes: Vec<ConsentChange>,
}

impl ConsentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_consent(&mut self, key: ConsentKey, value: bool) {
        let slot = self.consents.slot(key);
        if *slot == value {
            return;
        }
        *slot = value;
        self.changes.push(ConsentChange {
            key,
            value,
            at: Utc::now(),
        });
    }

    pub fn can_proceed(&self) -> bool {
        self.consents.can_proceed()
    }

    pub fn consents(&self) -> ConsentSet {
        self.consents
    }

    pub fn changes(&self) -> &[ConsentChange] {
        &self.changes
    }
}
