use anyhow::{Error, Result, anyhow, bail};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::parameters::NodeParameters;
use crate::reply_markup::ReplyMarkup;

/// One Telegram Bot API call, fully described by the selected resource and
/// operation plus the fields that operation requires.
#[derive(Debug, Clone, PartialEq)]
pub enum TelegramRequest {
    Chat(ChatOperation),
    Callback(CallbackOperation),
    Message(MessageOperation),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOperation {
    Get { chat_id: String },
    Leave { chat_id: String },
    Member { chat_id: String, user_id: String },
    SetDescription { chat_id: String, description: String },
    SetTitle { chat_id: String, title: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOperation {
    AnswerQuery {
        query_id: String,
        additional_fields: Map<String, Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageOperation {
    EditMessageText {
        target: EditTarget,
        text: String,
        extras: MessageExtras,
    },
    SendChatAction {
        chat_id: String,
        /// Sent as given, e.g. `typing` or `upload_voice`.
        action: String,
    },
    SendMessage {
        chat_id: String,
        text: String,
        extras: MessageExtras,
    },
    /// sendAudio, sendDocument, sendPhoto, sendSticker and sendVideo.
    SendFile {
        kind: FileKind,
        chat_id: String,
        file: String,
        extras: MessageExtras,
    },
}

/// Which message `editMessageText` addresses.
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    Chat { chat_id: String, message_id: String },
    Inline { inline_message_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Audio,
    Document,
    Photo,
    Sticker,
    Video,
}

/// Reply markup and the free-form "additional fields" bag shared by the
/// message operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageExtras {
    pub reply_markup: Option<ReplyMarkup>,
    pub additional_fields: Map<String, Value>,
}

fn unknown_operation(operation: &str, resource: &str) -> Error {
    anyhow!(
        "The operation \"{}\" is not known for resource \"{}\"!",
        operation,
        resource
    )
}

impl TelegramRequest {
    /// Maps the resolved parameters of one record onto a request.
    pub fn from_parameters(params: &NodeParameters) -> Result<Self> {
        let resource = params.get_string("resource")?;
        match resource.as_str() {
            "chat" => Ok(Self::Chat(ChatOperation::from_parameters(params)?)),
            "callback" => Ok(Self::Callback(CallbackOperation::from_parameters(params)?)),
            "message" => Ok(Self::Message(MessageOperation::from_parameters(params)?)),
            other => bail!("The resource \"{}\" is not known!", other),
        }
    }

    /// Every bot API call is a POST.
    pub fn method(&self) -> Method {
        Method::POST
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Chat(op) => op.endpoint(),
            Self::Callback(op) => op.endpoint(),
            Self::Message(op) => op.endpoint(),
        }
    }

    pub fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        match self {
            Self::Chat(op) => op.write_body(&mut body),
            Self::Callback(op) => op.write_body(&mut body),
            Self::Message(op) => op.write_body(&mut body),
        }
        body
    }
}

impl ChatOperation {
    fn from_parameters(params: &NodeParameters) -> Result<Self> {
        let operation = params.get_string("operation")?;
        let chat_id = || params.get_string("chatId");
        Ok(match operation.as_str() {
            "get" => Self::Get {
                chat_id: chat_id()?,
            },
            "leave" => Self::Leave {
                chat_id: chat_id()?,
            },
            "member" => Self::Member {
                chat_id: chat_id()?,
                user_id: params.get_string("userId")?,
            },
            "setDescription" => Self::SetDescription {
                chat_id: chat_id()?,
                description: params.get_string("description")?,
            },
            "setTitle" => Self::SetTitle {
                chat_id: chat_id()?,
                title: params.get_string("title")?,
            },
            other => return Err(unknown_operation(other, "chat")),
        })
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Get { .. } => "getChat",
            Self::Leave { .. } => "leaveChat",
            Self::Member { .. } => "getChatMember",
            Self::SetDescription { .. } => "setChatDescription",
            Self::SetTitle { .. } => "setChatTitle",
        }
    }

    fn write_body(&self, body: &mut Map<String, Value>) {
        match self {
            Self::Get { chat_id } | Self::Leave { chat_id } => {
                insert(body, "chat_id", chat_id);
            }
            Self::Member { chat_id, user_id } => {
                insert(body, "chat_id", chat_id);
                insert(body, "user_id", user_id);
            }
            Self::SetDescription {
                chat_id,
                description,
            } => {
                insert(body, "chat_id", chat_id);
                insert(body, "description", description);
            }
            Self::SetTitle { chat_id, title } => {
                insert(body, "chat_id", chat_id);
                insert(body, "title", title);
            }
        }
    }
}

impl CallbackOperation {
    fn from_parameters(params: &NodeParameters) -> Result<Self> {
        let operation = params.get_string("operation")?;
        match operation.as_str() {
            "answerQuery" => Ok(Self::AnswerQuery {
                query_id: params.get_string("queryId")?,
                additional_fields: params.get_object("additionalFields")?,
            }),
            other => Err(unknown_operation(other, "callback")),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::AnswerQuery { .. } => "answerCallbackQuery",
        }
    }

    fn write_body(&self, body: &mut Map<String, Value>) {
        match self {
            Self::AnswerQuery {
                query_id,
                additional_fields,
            } => {
                insert(body, "callback_query_id", query_id);
                merge_additional_fields(body, additional_fields);
            }
        }
    }
}

impl MessageOperation {
    fn from_parameters(params: &NodeParameters) -> Result<Self> {
        let operation = params.get_string("operation")?;
        let file_kind = match operation.as_str() {
            "sendAudio" => Some(FileKind::Audio),
            "sendDocument" => Some(FileKind::Document),
            "sendPhoto" => Some(FileKind::Photo),
            "sendSticker" => Some(FileKind::Sticker),
            "sendVideo" => Some(FileKind::Video),
            _ => None,
        };
        if let Some(kind) = file_kind {
            return Ok(Self::SendFile {
                kind,
                chat_id: params.get_string("chatId")?,
                file: params.get_string("file")?,
                extras: MessageExtras::from_parameters(params)?,
            });
        }

        Ok(match operation.as_str() {
            "editMessageText" => {
                let message_type = params.get_string("messageType")?;
                let target = if message_type == "inlineMessage" {
                    EditTarget::Inline {
                        inline_message_id: params.get_string("inlineMessageId")?,
                    }
                } else {
                    EditTarget::Chat {
                        chat_id: params.get_string("chatId")?,
                        message_id: params.get_string("messageId")?,
                    }
                };
                Self::EditMessageText {
                    target,
                    text: params.get_string("text")?,
                    extras: MessageExtras::from_parameters(params)?,
                }
            }
            "sendChatAction" => Self::SendChatAction {
                chat_id: params.get_string("chatId")?,
                action: params.get_string("action")?,
            },
            "sendMessage" => Self::SendMessage {
                chat_id: params.get_string("chatId")?,
                text: params.get_string("text")?,
                extras: MessageExtras::from_parameters(params)?,
            },
            other => return Err(unknown_operation(other, "message")),
        })
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::EditMessageText { .. } => "editMessageText",
            Self::SendChatAction { .. } => "sendChatAction",
            Self::SendMessage { .. } => "sendMessage",
            Self::SendFile { kind, .. } => kind.endpoint(),
        }
    }

    fn write_body(&self, body: &mut Map<String, Value>) {
        match self {
            Self::EditMessageText {
                target,
                text,
                extras,
            } => {
                match target {
                    EditTarget::Inline { inline_message_id } => {
                        insert(body, "inline_message_id", inline_message_id);
                    }
                    EditTarget::Chat {
                        chat_id,
                        message_id,
                    } => {
                        insert(body, "chat_id", chat_id);
                        insert(body, "message_id", message_id);
                    }
                }
                insert(body, "text", text);
                extras.write_body(body);
            }
            Self::SendChatAction { chat_id, action } => {
                insert(body, "chat_id", chat_id);
                insert(body, "action", action);
            }
            Self::SendMessage {
                chat_id,
                text,
                extras,
            } => {
                insert(body, "chat_id", chat_id);
                insert(body, "text", text);
                extras.write_body(body);
            }
            Self::SendFile {
                kind,
                chat_id,
                file,
                extras,
            } => {
                insert(body, "chat_id", chat_id);
                insert(body, kind.body_key(), file);
                extras.write_body(body);
            }
        }
    }
}

impl FileKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Audio => "sendAudio",
            Self::Document => "sendDocument",
            Self::Photo => "sendPhoto",
            Self::Sticker => "sendSticker",
            Self::Video => "sendVideo",
        }
    }

    /// Body key the file reference (file_id or URL) is sent under.
    pub fn body_key(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Photo => "photo",
            Self::Sticker => "sticker",
            Self::Video => "video",
        }
    }
}

impl MessageExtras {
    fn from_parameters(params: &NodeParameters) -> Result<Self> {
        Ok(Self {
            reply_markup: ReplyMarkup::from_parameters(params)?,
            additional_fields: params.get_object("additionalFields")?,
        })
    }

    fn write_body(&self, body: &mut Map<String, Value>) {
        if let Some(markup) = &self.reply_markup {
            body.insert("reply_markup".to_string(), markup.to_value());
        }
        merge_additional_fields(body, &self.additional_fields);
    }
}

fn insert(body: &mut Map<String, Value>, key: &str, value: &str) {
    body.insert(key.to_string(), Value::String(value.to_string()));
}

/// Flat union of `fields` into `body`. Keys already set by the explicit
/// mapping are kept; the additional field is dropped.
pub fn merge_additional_fields(body: &mut Map<String, Value>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        if body.contains_key(key) {
            tracing::debug!(field = %key, "Additional field shadowed by mapped parameter");
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
}
