use super::{row_from, Resource};
use crate::backend::Row;
use crate::service::{FieldRule, Schema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerType {
    Assureur,
    CourtierGrossiste,
}

impl PartnerType {
    pub const ALL: &'static [&'static str] = &["assureur", "courtier_grossiste"];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Actif,
    Inactif,
}

impl PartnerStatus {
    pub const ALL: &'static [&'static str] = &["actif", "inactif"];
}

/// Insurer or wholesale broker the cabinet places contracts with.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub nom: String,
    #[serde(rename = "type")]
    pub kind: PartnerType,
    pub produits: Vec<String>,
    pub statut: PartnerStatus,
    pub contact_principal: String,
    pub email: String,
    pub telephone: String,
    #[serde(default)]
    pub site_web: Option<String>,
    #[serde(default)]
    pub intranet: Option<String>,
}

impl Resource for Partner {
    const TABLE: &'static str = "partners";
    const NOT_FOUND: &'static str = "Partenaire introuvable";
    const FILTERS: &'static [&'static str] = &["type", "statut"];
    type Payload = Partner;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .field(FieldRule::text("nom").required())
                .field(FieldRule::text("type").required().one_of(PartnerType::ALL))
                .field(FieldRule::text_list("produits").required())
                .field(FieldRule::text("statut").required().one_of(PartnerStatus::ALL))
                .field(FieldRule::text("contactPrincipal").required())
                .field(FieldRule::text("email").required().email())
                .field(FieldRule::text("telephone").required())
                .field(FieldRule::text("siteWeb").url())
                .field(FieldRule::text("intranet").url())
        })
    }

    fn from_payload(payload: Partner) -> Self {
        payload
    }

    fn to_row(&self) -> Row {
        row_from(json!({
            "nom": self.nom,
            "type": self.kind,
            "produits": self.produits,
            "statut": self.statut,
            "contact_principal": self.contact_principal,
            "email": self.email,
            "telephone": self.telephone,
            "site_web": self.site_web,
            "intranet": self.intranet,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_urls_are_checked_only_when_present() {
        let mut body = json!({
            "nom": "Mutuelle Atlantique",
            "type": "assureur",
            "produits": ["sante", "prevoyance"],
            "statut": "actif",
            "contactPrincipal": "J. Durand",
            "email": "partenariats@atlantique.fr",
            "telephone": "0240000000"
        });
        let partner = Partner::parse(&body).unwrap();
        assert_eq!(partner.site_web, None);
        assert_eq!(partner.to_row()["produits"], json!(["sante", "prevoyance"]));

        body["siteWeb"] = json!("atlantique.fr");
        body["intranet"] = json!("https://extranet.atlantique.fr/courtiers");
        let err = Partner::parse(&body).unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert!(err.has_field("siteWeb"));
    }

    #[test]
    fn rejects_unknown_enums_and_bad_product_lists() {
        let err = Partner::parse(&json!({
            "nom": "X",
            "type": "banque",
            "produits": ["auto", 3],
            "statut": "suspendu",
            "contactPrincipal": "Y",
            "email": "x@y.fr",
            "telephone": "01"
        }))
        .unwrap_err();
        for f in ["type", "produits", "statut"] {
            assert!(err.has_field(f), "{f}");
        }
    }
}
