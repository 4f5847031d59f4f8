use super::{row_from, Resource};
use crate::backend::Row;
use crate::service::{FieldRule, Schema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Prospect,
    Client,
}

impl ContactStatus {
    pub const ALL: &'static [&'static str] = &["prospect", "client"];
}

/// Company identity, present exactly when the contact is flagged professional.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfessionalDetails {
    pub professional_type: String,
    pub entreprise: String,
    pub siret: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub individual: bool,
    pub professional: Option<ProfessionalDetails>,
    pub statut: ContactStatus,
}

#[derive(Deserialize, Default)]
pub struct ContactTypes {
    #[serde(default)]
    pub particulier: Option<bool>,
    #[serde(default)]
    pub professionnel: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub types: ContactTypes,
    #[serde(default, deserialize_with = "text_or_none")]
    pub professional_type: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub entreprise: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub siret: Option<String>,
    pub statut: ContactStatus,
}

/// Company fields are only type-checked while the professional flag is set,
/// so any other value is read as absent here.
fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl Resource for Contact {
    const TABLE: &'static str = "contacts";
    const NOT_FOUND: &'static str = "Contact introuvable";
    const FILTERS: &'static [&'static str] = &["statut", "email"];
    type Payload = ContactPayload;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .field(FieldRule::text("nom").required())
                .field(FieldRule::text("prenom").required())
                .field(FieldRule::text("email").required().email())
                .field(FieldRule::text("telephone").required())
                .field(FieldRule::object("types").required())
                .field(FieldRule::boolean("types.particulier"))
                .field(FieldRule::boolean("types.professionnel"))
                .field(FieldRule::text("statut").required().one_of(ContactStatus::ALL))
                .any_flag("types", &["types.particulier", "types.professionnel"])
                .when(
                    "types.professionnel",
                    vec![
                        FieldRule::text("professionalType"),
                        FieldRule::text("entreprise"),
                        FieldRule::text("siret").length(14),
                    ],
                )
        })
    }

    fn from_payload(p: ContactPayload) -> Self {
        let professional = p.types.professionnel.unwrap_or(false).then(|| ProfessionalDetails {
            professional_type: p.professional_type.unwrap_or_default(),
            entreprise: p.entreprise.unwrap_or_default(),
            siret: p.siret.unwrap_or_default(),
        });
        Contact {
            nom: p.nom,
            prenom: p.prenom,
            email: p.email,
            telephone: p.telephone,
            individual: p.types.particulier.unwrap_or(false),
            professional,
            statut: p.statut,
        }
    }

    fn to_row(&self) -> Row {
        let pro = self.professional.as_ref();
        row_from(json!({
            "nom": self.nom,
            "prenom": self.prenom,
            "email": self.email,
            "telephone": self.telephone,
            "types": {
                "particulier": self.individual,
                "professionnel": pro.is_some(),
            },
            "professional_type": pro.map(|p| p.professional_type.as_str()),
            "entreprise": pro.map(|p| p.entreprise.as_str()),
            "siret": pro.map(|p| p.siret.as_str()),
            "statut": self.statut,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn professional_payload() -> Value {
        json!({
            "nom": "Martin",
            "prenom": "Claire",
            "email": "claire@martin.fr",
            "telephone": "0601020304",
            "types": { "particulier": false, "professionnel": true },
            "entreprise": "Martin SARL",
            "siret": "12345678901234",
            "statut": "prospect"
        })
    }

    #[test]
    fn professional_contact_needs_professional_type() {
        let err = Contact::parse(&professional_payload()).unwrap_err();
        assert!(err.has_field("professionalType"));

        let mut body = professional_payload();
        body["professionalType"] = json!("artisan");
        let contact = Contact::parse(&body).unwrap();
        assert_eq!(
            contact.professional.as_ref().map(|p| p.professional_type.as_str()),
            Some("artisan")
        );
    }

    #[test]
    fn individual_contact_drops_company_fields() {
        let mut body = professional_payload();
        body["types"] = json!({ "particulier": true });
        body["siret"] = json!("short");
        let contact = Contact::parse(&body).unwrap();
        assert!(contact.professional.is_none());
        let row = contact.to_row();
        assert_eq!(row["siret"], Value::Null);
        assert_eq!(row["types"], json!({ "particulier": true, "professionnel": false }));
        assert_eq!(row["statut"], json!("prospect"));
    }

    #[test]
    fn null_type_flag_reads_as_unset() {
        let mut body = professional_payload();
        body["types"] = json!({ "particulier": true, "professionnel": null });
        let contact = Contact::parse(&body).unwrap();
        assert!(contact.individual);
        assert!(contact.professional.is_none());
    }

    #[test]
    fn company_fields_of_an_individual_are_ignored_whatever_their_type() {
        let mut body = professional_payload();
        body["types"] = json!({ "particulier": true, "professionnel": false });
        body["professionalType"] = json!(5);
        body["siret"] = json!({ "n": 1 });
        let contact = Contact::parse(&body).unwrap();
        assert!(contact.professional.is_none());
        assert_eq!(contact.to_row()["professional_type"], Value::Null);
    }

    #[test]
    fn non_text_company_fields_of_a_professional_are_field_errors() {
        let mut body = professional_payload();
        body["professionalType"] = json!(5);
        let err = Contact::parse(&body).unwrap_err();
        assert!(err.has_field("professionalType"));
        assert!(!err.has_field("$"));
    }

    #[test]
    fn siret_must_have_fourteen_characters() {
        let mut body = professional_payload();
        body["professionalType"] = json!("artisan");
        body["siret"] = json!("1234");
        assert!(Contact::parse(&body).unwrap_err().has_field("siret"));
    }

    #[test]
    fn at_least_one_type_and_a_known_status() {
        let mut body = professional_payload();
        body["types"] = json!({});
        body["statut"] = json!("ancien");
        let err = Contact::parse(&body).unwrap_err();
        assert!(err.has_field("types"));
        assert!(err.has_field("statut"));
    }
}
