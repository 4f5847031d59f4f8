//! Declarative payload validation: field rules, flag-conditional rules and cross-field checks.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// One field-level problem, keyed by the wire name (dotted for nested fields).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// Every violation found in a payload, in rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| format!("{}: {}", v.field, v.message)).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    TextList,
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
    Url,
}

#[derive(Clone, Debug)]
pub struct FieldRule {
    pub path: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub allowed: Option<&'static [&'static str]>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exact_length: Option<usize>,
    pub format: Option<Format>,
}

impl FieldRule {
    fn new(path: &'static str, kind: FieldKind) -> Self {
        FieldRule {
            path,
            kind,
            required: false,
            allowed: None,
            minimum: None,
            exclusive_minimum: None,
            maximum: None,
            exact_length: None,
            format: None,
        }
    }

    pub fn text(path: &'static str) -> Self {
        Self::new(path, FieldKind::Text)
    }

    pub fn number(path: &'static str) -> Self {
        Self::new(path, FieldKind::Number)
    }

    pub fn boolean(path: &'static str) -> Self {
        Self::new(path, FieldKind::Boolean)
    }

    pub fn date(path: &'static str) -> Self {
        Self::new(path, FieldKind::Date)
    }

    pub fn text_list(path: &'static str) -> Self {
        Self::new(path, FieldKind::TextList)
    }

    pub fn object(path: &'static str) -> Self {
        Self::new(path, FieldKind::Object)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub fn positive(mut self) -> Self {
        self.exclusive_minimum = Some(0.0);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    pub fn length(mut self, len: usize) -> Self {
        self.exact_length = Some(len);
        self
    }

    pub fn email(mut self) -> Self {
        self.format = Some(Format::Email);
        self
    }

    pub fn url(mut self) -> Self {
        self.format = Some(Format::Url);
        self
    }
}

/// Rules that only apply (as required fields) while a boolean flag is true.
#[derive(Clone, Debug)]
pub struct Conditional {
    pub flag: &'static str,
    pub rules: Vec<FieldRule>,
}

/// `end` must fall on a later calendar day than `start` when both are valid dates.
/// Times of day are ignored, since date fields are stored as days.
#[derive(Clone, Debug)]
pub struct DateOrder {
    pub start: &'static str,
    pub end: &'static str,
}

/// At least one of the boolean flags must be true.
#[derive(Clone, Debug)]
pub struct AnyFlag {
    pub field: &'static str,
    pub flags: &'static [&'static str],
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub fields: Vec<FieldRule>,
    pub conditionals: Vec<Conditional>,
    pub date_orders: Vec<DateOrder>,
    pub any_flags: Vec<AnyFlag>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    pub fn when(mut self, flag: &'static str, rules: Vec<FieldRule>) -> Self {
        let rules = rules.into_iter().map(FieldRule::required).collect();
        self.conditionals.push(Conditional { flag, rules });
        self
    }

    pub fn date_after(mut self, end: &'static str, start: &'static str) -> Self {
        self.date_orders.push(DateOrder { start, end });
        self
    }

    pub fn any_flag(mut self, field: &'static str, flags: &'static [&'static str]) -> Self {
        self.any_flags.push(AnyFlag { field, flags });
        self
    }

    /// Check a payload against every rule. Collects all violations instead of stopping at the first.
    pub fn validate(&self, payload: &Value) -> Result<(), Violations> {
        let mut out = Violations::default();
        if !payload.is_object() {
            out.push("$", "le corps de la requête doit être un objet JSON");
            return Err(out);
        }
        for rule in &self.fields {
            check_field(payload, rule, &mut out);
        }
        for cond in &self.conditionals {
            if lookup(payload, cond.flag) == Some(&Value::Bool(true)) {
                for rule in &cond.rules {
                    check_field(payload, rule, &mut out);
                }
            }
        }
        for any in &self.any_flags {
            let set = any
                .flags
                .iter()
                .any(|f| lookup(payload, f) == Some(&Value::Bool(true)));
            if !set && !out.has_field(any.field) {
                out.push(
                    any.field,
                    format!("au moins une option parmi {} doit être cochée", any.flags.join(", ")),
                );
            }
        }
        for order in &self.date_orders {
            let start = lookup(payload, order.start).and_then(Value::as_str).and_then(parse_date);
            let end = lookup(payload, order.end).and_then(Value::as_str).and_then(parse_date);
            if let (Some(start), Some(end)) = (start, end) {
                if end.date() <= start.date() {
                    out.push(order.end, format!("doit être postérieure à {}", order.start));
                }
            }
        }
        out.into_result()
    }
}

/// Resolve a dotted path (`types.professionnel`) inside a JSON object.
pub fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |v, key| v.get(key))
}

/// Accepts `YYYY-MM-DD` (midnight) or an RFC 3339 timestamp (normalised to UTC).
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

fn check_field(payload: &Value, rule: &FieldRule, out: &mut Violations) {
    let value = match lookup(payload, rule.path) {
        None | Some(Value::Null) => {
            if rule.required {
                out.push(rule.path, "champ requis");
            }
            return;
        }
        Some(v) => v,
    };
    match rule.kind {
        FieldKind::Text => {
            let Some(s) = value.as_str() else {
                out.push(rule.path, "doit être une chaîne de caractères");
                return;
            };
            if rule.required && s.trim().is_empty() {
                out.push(rule.path, "champ requis");
                return;
            }
            if let Some(len) = rule.exact_length {
                if s.chars().count() != len {
                    out.push(rule.path, format!("doit contenir exactement {} caractères", len));
                }
            }
            match rule.format {
                Some(Format::Email) if !email_regex().is_match(s) => {
                    out.push(rule.path, "doit être une adresse email valide");
                }
                Some(Format::Url) if !is_http_url(s) => {
                    out.push(rule.path, "doit être une URL valide");
                }
                _ => {}
            }
            if let Some(allowed) = rule.allowed {
                if !allowed.contains(&s) {
                    out.push(
                        rule.path,
                        format!("doit être l'une des valeurs : {}", allowed.join(", ")),
                    );
                }
            }
        }
        FieldKind::Number => {
            let Some(n) = value.as_f64() else {
                out.push(rule.path, "doit être un nombre");
                return;
            };
            if let Some(min) = rule.minimum {
                if n < min {
                    out.push(rule.path, format!("doit être supérieur ou égal à {}", min));
                }
            }
            if let Some(min) = rule.exclusive_minimum {
                if n <= min {
                    out.push(rule.path, format!("doit être strictement supérieur à {}", min));
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    out.push(rule.path, format!("doit être inférieur ou égal à {}", max));
                }
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                out.push(rule.path, "doit être un booléen");
            }
        }
        FieldKind::Date => {
            if value.as_str().and_then(parse_date).is_none() {
                out.push(rule.path, "doit être une date valide");
            }
        }
        FieldKind::TextList => {
            let ok = value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false);
            if !ok {
                out.push(rule.path, "doit être une liste de chaînes de caractères");
            }
        }
        FieldKind::Object => {
            if !value.is_object() {
                out.push(rule.path, "doit être un objet");
            }
        }
    }
}

fn is_http_url(s: &str) -> bool {
    reqwest::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
