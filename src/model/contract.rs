use super::{row_from, Resource};
use crate::backend::Row;
use crate::service::{parse_date, FieldRule, Schema};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    Auto,
    Habitation,
    Sante,
    Prevoyance,
    Emprunteur,
    Vie,
    Retraite,
    RcPro,
    MultirisquePro,
    Flotte,
}

impl InsuranceType {
    pub const ALL: &'static [&'static str] = &[
        "auto",
        "habitation",
        "sante",
        "prevoyance",
        "emprunteur",
        "vie",
        "retraite",
        "rc_pro",
        "multirisque_pro",
        "flotte",
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractCategory {
    Particulier,
    Professionnel,
}

impl ContractCategory {
    pub const ALL: &'static [&'static str] = &["particulier", "professionnel"];
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub client_id: String,
    #[serde(rename = "type")]
    pub kind: InsuranceType,
    pub categorie: ContractCategory,
    pub montant_annuel: f64,
    #[serde(deserialize_with = "calendar_date")]
    pub date_debut: NaiveDate,
    #[serde(deserialize_with = "calendar_date")]
    pub date_fin: NaiveDate,
    pub partenaire_id: String,
    pub commission_annee1: f64,
    pub commission_recurrente: f64,
    pub frais_dossier: f64,
    pub frais_recurrents: bool,
}

fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s)
        .map(|d| d.date())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s)))
}

impl Resource for Contract {
    const TABLE: &'static str = "contracts";
    const NOT_FOUND: &'static str = "Contrat introuvable";
    const FILTERS: &'static [&'static str] = &["clientId", "partenaireId", "type", "categorie"];
    type Payload = Contract;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .field(FieldRule::text("clientId").required())
                .field(FieldRule::text("type").required().one_of(InsuranceType::ALL))
                .field(FieldRule::text("categorie").required().one_of(ContractCategory::ALL))
                .field(FieldRule::number("montantAnnuel").required().positive())
                .field(FieldRule::date("dateDebut").required())
                .field(FieldRule::date("dateFin").required())
                .field(FieldRule::text("partenaireId").required())
                .field(FieldRule::number("commissionAnnee1").required().min(0.0).max(100.0))
                .field(FieldRule::number("commissionRecurrente").required().min(0.0).max(100.0))
                .field(FieldRule::number("fraisDossier").required().min(0.0))
                .field(FieldRule::boolean("fraisRecurrents").required())
                .date_after("dateFin", "dateDebut")
        })
    }

    fn from_payload(payload: Contract) -> Self {
        payload
    }

    fn to_row(&self) -> Row {
        row_from(json!({
            "client_id": self.client_id,
            "type": self.kind,
            "categorie": self.categorie,
            "montant_annuel": self.montant_annuel,
            "date_debut": self.date_debut.format("%Y-%m-%d").to_string(),
            "date_fin": self.date_fin.format("%Y-%m-%d").to_string(),
            "partenaire_id": self.partenaire_id,
            "commission_annee1": self.commission_annee1,
            "commission_recurrente": self.commission_recurrente,
            "frais_dossier": self.frais_dossier,
            "frais_recurrents": self.frais_recurrents,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn payload() -> Value {
        json!({
            "clientId": "c-1",
            "type": "habitation",
            "categorie": "particulier",
            "montantAnnuel": 480.5,
            "dateDebut": "2024-01-01",
            "dateFin": "2025-01-01",
            "partenaireId": "p-1",
            "commissionAnnee1": 15,
            "commissionRecurrente": 5,
            "fraisDossier": 0,
            "fraisRecurrents": false
        })
    }

    #[test]
    fn valid_contract_round_trips_to_a_row() {
        let contract = Contract::parse(&payload()).unwrap();
        assert_eq!(contract.kind, InsuranceType::Habitation);
        let row = contract.to_row();
        assert_eq!(row["date_fin"], json!("2025-01-01"));
        assert_eq!(row["type"], json!("habitation"));
        assert_eq!(row["commission_annee1"], json!(15.0));
    }

    #[test]
    fn end_date_not_after_start_always_fails() {
        for end in ["2024-01-01", "2023-06-30"] {
            let mut body = payload();
            body["dateFin"] = json!(end);
            let err = Contract::parse(&body).unwrap_err();
            assert!(err.has_field("dateFin"), "{end}");
        }

        let mut body = payload();
        body["dateFin"] = json!("2023-12-31");
        body["montantAnnuel"] = json!(-3);
        body["type"] = json!("moto");
        let err = Contract::parse(&body).unwrap_err();
        assert!(err.has_field("dateFin"));
        assert!(err.has_field("montantAnnuel"));
        assert!(err.has_field("type"));
    }

    #[test]
    fn timestamps_are_ordered_by_stored_day() {
        let mut body = payload();
        body["dateDebut"] = json!("2024-01-01T08:00:00Z");
        body["dateFin"] = json!("2024-01-01T18:00:00Z");
        assert!(Contract::parse(&body).unwrap_err().has_field("dateFin"));

        body["dateFin"] = json!("2024-01-02T07:00:00Z");
        let row = Contract::parse(&body).unwrap().to_row();
        assert_eq!(row["date_debut"], json!("2024-01-01"));
        assert_eq!(row["date_fin"], json!("2024-01-02"));
    }

    #[test]
    fn bounds_on_amounts_and_commissions() {
        let mut body = payload();
        body["montantAnnuel"] = json!(0);
        body["commissionAnnee1"] = json!(100.5);
        body["commissionRecurrente"] = json!(-1);
        body["fraisDossier"] = json!(-0.01);
        let err = Contract::parse(&body).unwrap_err();
        for f in ["montantAnnuel", "commissionAnnee1", "commissionRecurrente", "fraisDossier"] {
            assert!(err.has_field(f), "{f}");
        }

        let mut body = payload();
        body["commissionAnnee1"] = json!(100);
        body["fraisDossier"] = json!(0);
        assert!(Contract::parse(&body).is_ok());
    }
}
