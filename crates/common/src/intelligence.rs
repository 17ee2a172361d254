use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The five kinds of evidence harvested from a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    BankAccount,
    UpiId,
    PhoneNumber,
    PhishingLink,
    SuspiciousKeyword,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::BankAccount,
        Self::UpiId,
        Self::PhoneNumber,
        Self::PhishingLink,
        Self::SuspiciousKeyword,
    ];
}

/// Accumulated evidence for one session.
///
/// Sets only ever grow. Entries are trimmed and empty strings are rejected,
/// so every mutation goes through [`IntelligenceRecord::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntelligenceRecord {
    pub bank_accounts: BTreeSet<String>,
    pub upi_ids: BTreeSet<String>,
    pub phishing_links: BTreeSet<String>,
    pub phone_numbers: BTreeSet<String>,
    pub suspicious_keywords: BTreeSet<String>,
}

impl IntelligenceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::BankAccount => &self.bank_accounts,
            Category::UpiId => &self.upi_ids,
            Category::PhoneNumber => &self.phone_numbers,
            Category::PhishingLink => &self.phishing_links,
            Category::SuspiciousKeyword => &self.suspicious_keywords,
        }
    }

    fn entries_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::BankAccount => &mut self.bank_accounts,
            Category::UpiId => &mut self.upi_ids,
            Category::PhoneNumber => &mut self.phone_numbers,
            Category::PhishingLink => &mut self.phishing_links,
            Category::SuspiciousKeyword => &mut self.suspicious_keywords,
        }
    }

    /// Add a value to a category. Returns true if the value was new.
    pub fn insert(&mut self, category: Category, value: impl AsRef<str>) -> bool {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return false;
        }
        self.entries_mut(category).insert(value.to_string())
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for category in Category::ALL {
            for value in other.entries(category) {
                self.insert(category, value);
            }
        }
    }

    /// Union of `self` and `other` without touching either.
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    pub fn contains(&self, category: Category, value: &str) -> bool {
        self.entries(category).contains(value)
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.entries(*c).is_empty())
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.entries(*c).len()).sum()
    }
}
