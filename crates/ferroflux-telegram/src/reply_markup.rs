use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::parameters::NodeParameters;

/// Interactive keyboard or reply control attached to a sent message.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMarkup {
    InlineKeyboard(Vec<Vec<KeyboardButton>>),
    ReplyKeyboard {
        rows: Vec<Vec<KeyboardButton>>,
        /// resize_keyboard, one_time_keyboard, selective
        options: Map<String, Value>,
    },
    ForceReply(Map<String, Value>),
    ReplyKeyboardRemove(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardButton {
    pub text: String,
    pub fields: Map<String, Value>,
}

// Shape of the `inlineKeyboard` / `replyKeyboard` fixed collections:
// { rows: [ { row: { buttons: [ { text, additionalFields } ] } } ] }
#[derive(Debug, Default, Deserialize)]
struct KeyboardCollection {
    #[serde(default)]
    rows: Vec<RowEntry>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    #[serde(default)]
    row: Option<RowButtons>,
}

#[derive(Debug, Deserialize)]
struct RowButtons {
    #[serde(default)]
    buttons: Vec<ButtonEntry>,
}

#[derive(Debug, Deserialize)]
struct ButtonEntry {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "additionalFields")]
    additional_fields: Map<String, Value>,
}

impl ReplyMarkup {
    /// Reads `replyMarkup` and the collection it selects. `none` yields `None`.
    pub fn from_parameters(params: &NodeParameters) -> Result<Option<Self>> {
        let option = params.get_string("replyMarkup")?;
        let markup = match option.as_str() {
            "none" => return Ok(None),
            "inlineKeyboard" => Self::InlineKeyboard(keyboard_rows(params, "inlineKeyboard")?),
            "replyKeyboard" => Self::ReplyKeyboard {
                rows: keyboard_rows(params, "replyKeyboard")?,
                options: params.get_object("replyKeyboardOptions")?,
            },
            "forceReply" => Self::ForceReply(params.get_object("forceReply")?),
            "replyKeyboardRemove" => {
                Self::ReplyKeyboardRemove(params.get_object("replyKeyboardRemove")?)
            }
            other => bail!("The reply markup \"{}\" is not known!", other),
        };
        Ok(Some(markup))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::InlineKeyboard(rows) => {
                let mut markup = Map::new();
                markup.insert("inline_keyboard".to_string(), rows_to_value(rows));
                Value::Object(markup)
            }
            Self::ReplyKeyboard { rows, options } => {
                let mut markup = options.clone();
                markup.insert("keyboard".to_string(), rows_to_value(rows));
                Value::Object(markup)
            }
            Self::ForceReply(fields) | Self::ReplyKeyboardRemove(fields) => {
                Value::Object(fields.clone())
            }
        }
    }
}

impl KeyboardButton {
    pub fn to_value(&self) -> Value {
        let mut button = Map::new();
        button.insert("text".to_string(), Value::String(self.text.clone()));
        for (key, value) in &self.fields {
            button.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(button)
    }
}

fn keyboard_rows(params: &NodeParameters, name: &str) -> Result<Vec<Vec<KeyboardButton>>> {
    let raw = params.get(name)?;
    let collection: KeyboardCollection = if raw.is_null() {
        KeyboardCollection::default()
    } else {
        serde_json::from_value(raw).with_context(|| format!("Invalid keyboard in \"{}\"", name))?
    };

    // Entries without buttons are dropped; Telegram rejects empty rows.
    Ok(collection
        .rows
        .into_iter()
        .filter_map(|entry| entry.row)
        .filter(|row| !row.buttons.is_empty())
        .map(|row| {
            row.buttons
                .into_iter()
                .map(|b| KeyboardButton {
                    text: b.text,
                    fields: b.additional_fields,
                })
                .collect()
        })
        .collect())
}

fn rows_to_value(rows: &[Vec<KeyboardButton>]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| Value::Array(row.iter().map(KeyboardButton::to_value).collect()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::NodeDescription;
    use serde_json::json;

    fn markup(v: Value) -> Result<Option<ReplyMarkup>> {
        let description = NodeDescription::telegram().unwrap();
        let values = v.as_object().cloned().unwrap();
        let params = NodeParameters::new(&description, &values);
        ReplyMarkup::from_parameters(&params)
    }

    #[test]
    fn test_none_by_default() {
        let result = markup(json!({ "resource": "message", "operation": "sendMessage" })).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_inline_keyboard() {
        let result = markup(json!({
            "resource": "message",
            "operation": "sendMessage",
            "replyMarkup": "inlineKeyboard",
            "inlineKeyboard": {
                "rows": [
                    { "row": { "buttons": [
                        { "text": "Yes", "additionalFields": { "callback_data": "y" } },
                        { "text": "Docs", "additionalFields": { "url": "https://core.telegram.org" } }
                    ] } },
                    { "row": { "buttons": [ { "text": "Pay", "additionalFields": { "pay": true } } ] } }
                ]
            }
        }))
        .unwrap()
        .unwrap();

        assert_eq!(
            result.to_value(),
            json!({
                "inline_keyboard": [
                    [
                        { "text": "Yes", "callback_data": "y" },
                        { "text": "Docs", "url": "https://core.telegram.org" }
                    ],
                    [ { "text": "Pay", "pay": true } ]
                ]
            })
        );
    }

    #[test]
    fn test_empty_inline_keyboard() {
        let result = markup(json!({
            "resource": "message",
            "operation": "editMessageText",
            "replyMarkup": "inlineKeyboard"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(result.to_value(), json!({ "inline_keyboard": [] }));
    }

    #[test]
    fn test_rows_without_buttons_are_skipped() {
        let result = markup(json!({
            "resource": "message",
            "operation": "sendMessage",
            "replyMarkup": "inlineKeyboard",
            "inlineKeyboard": {
                "rows": [
                    { "row": { "buttons": [ { "text": "A" } ] } },
                    { "row": {} },
                    {}
                ]
            }
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            result.to_value(),
            json!({ "inline_keyboard": [ [ { "text": "A" } ] ] })
        );
    }

    #[test]
    fn test_reply_keyboard_with_options() {
        let result = markup(json!({
            "resource": "message",
            "operation": "sendPhoto",
            "replyMarkup": "replyKeyboard",
            "replyKeyboard": {
                "rows": [ { "row": { "buttons": [
                    { "text": "Share phone", "additionalFields": { "request_contact": true } }
                ] } } ]
            },
            "replyKeyboardOptions": { "resize_keyboard": true, "one_time_keyboard": true }
        }))
        .unwrap()
        .unwrap();

        assert_eq!(
            result.to_value(),
            json!({
                "keyboard": [ [ { "text": "Share phone", "request_contact": true } ] ],
                "resize_keyboard": true,
                "one_time_keyboard": true
            })
        );
    }

    #[test]
    fn test_force_reply_and_remove_pass_through() {
        let force = markup(json!({
            "resource": "message",
            "replyMarkup": "forceReply",
            "forceReply": { "force_reply": true, "selective": false }
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            force.to_value(),
            json!({ "force_reply": true, "selective": false })
        );

        let remove = markup(json!({
            "resource": "message",
            "replyMarkup": "replyKeyboardRemove",
            "replyKeyboardRemove": { "remove_keyboard": true }
        }))
        .unwrap()
        .unwrap();
        assert_eq!(remove.to_value(), json!({ "remove_keyboard": true }));
    }

    #[test]
    fn test_unknown_markup() {
        let err = markup(json!({
            "resource": "message",
            "replyMarkup": "carousel"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("carousel"));
    }
}
