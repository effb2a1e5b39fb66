use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ServiceError;
use crate::database::Store;
use crate::policy::Viewer;

/// Interface languages the site is translated into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ru,
    En,
    Ky,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Ru, Locale::En, Locale::Ky];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
            Locale::Ky => "ky",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageInput {
    pub locale: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageChoice {
    pub ok: bool,
    pub locale: Locale,
}

pub struct ProfileService<'a> {
    store: &'a dyn Store,
}

impl<'a> ProfileService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Anonymous visitors only get the cookie; signed-in users also keep the
    /// choice on their account.
    pub async fn set_language(&self, viewer: &Viewer, input: &LanguageInput) -> Result<LanguageChoice, ServiceError> {
        let locale: Locale = input
            .locale
            .parse()
            .map_err(|_| ServiceError::validation("Invalid locale"))?;

        if let Some(user_id) = viewer.user_id.as_deref() {
            self.store.update_user_language(user_id, locale.as_str()).await?;
            tracing::info!("User {} switched language to {}", user_id, locale);
        }

        Ok(LanguageChoice { ok: true, locale })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseError, SessionStore};
    use crate::policy::PolicyResolver;
    use crate::testing::MemoryStore;

    fn input(locale: &str) -> LanguageInput {
        LanguageInput {
            locale: locale.to_string(),
        }
    }

    #[tokio::test]
    async fn signed_in_choice_is_saved() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        let viewer = PolicyResolver::new(&store)
            .viewer(Some("parent".to_string()), None)
            .await
            .unwrap();

        let choice = ProfileService::new(&store).set_language(&viewer, &input("ky")).await.unwrap();
        assert!(choice.ok);
        assert_eq!(choice.locale, Locale::Ky);
        let user = store.find_user("parent").await.unwrap().unwrap();
        assert_eq!(user.language, "ky");
    }

    #[tokio::test]
    async fn anonymous_choice_touches_no_account() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let choice = ProfileService::new(&store)
            .set_language(&Viewer::anonymous(), &input("en"))
            .await
            .unwrap();
        assert_eq!(choice.locale, Locale::En);
    }

    #[tokio::test]
    async fn unknown_locales_are_rejected_before_saving() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        let viewer = PolicyResolver::new(&store)
            .viewer(Some("parent".to_string()), None)
            .await
            .unwrap();

        for locale in ["kk", "RU", ""] {
            let result = ProfileService::new(&store).set_language(&viewer, &input(locale)).await;
            assert!(matches!(result, Err(ServiceError::Validation(_))), "{:?}", locale);
        }
        let user = store.find_user("parent").await.unwrap().unwrap();
        assert_eq!(user.language, "ru");
    }

    #[tokio::test]
    async fn store_outage_is_reported() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        let viewer = PolicyResolver::new(&store)
            .viewer(Some("parent".to_string()), None)
            .await
            .unwrap();
        store.set_unavailable(true);

        let result = ProfileService::new(&store).set_language(&viewer, &input("en")).await;
        assert!(matches!(result, Err(ServiceError::Database(DatabaseError::ConnectionError(_)))));
    }
}
