use std::str::FromStr;

use anyhow::anyhow;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum Locale {
  #[default]
  En,
  Ko
}

impl Locale {
  /// Weekday labels starting Sunday.
  pub fn weekday_labels(
    self
  ) -> [&'static str; 7] {
    match self {
      | Locale::En => {
        [
          "Sun", "Mon", "Tue", "Wed",
          "Thu", "Fri", "Sat"
        ]
      }
      | Locale::Ko => {
        [
          "일", "월", "화", "수", "목",
          "금", "토"
        ]
      }
    }
  }

  pub fn message(
    self,
    msg: Message
  ) -> &'static str {
    match (self, msg) {
      | (Locale::En, Message::EmptyText) => {
        "Please enter a task."
      }
      | (Locale::Ko, Message::EmptyText) => {
        "할 일을 입력해주세요!"
      }
      | (Locale::En, Message::MissingDate) => {
        "Please pick a date."
      }
      | (Locale::Ko, Message::MissingDate) => {
        "날짜를 선택해주세요!"
      }
      | (
        Locale::En,
        Message::ConfirmDelete
      ) => "Delete this task?",
      | (
        Locale::Ko,
        Message::ConfirmDelete
      ) => "정말 삭제하시겠습니까?",
      | (Locale::En, Message::SaveFailed) => {
        "Saving tasks failed."
      }
      | (Locale::Ko, Message::SaveFailed) => {
        "데이터 저장 중 오류가 발생했습니다."
      }
      | (Locale::En, Message::NotFound) => {
        "That task no longer exists."
      }
      | (Locale::Ko, Message::NotFound) => {
        "할 일을 찾을 수 없습니다."
      }
      | (
        Locale::En,
        Message::NoActiveEdit
      ) => "Nothing is being edited.",
      | (
        Locale::Ko,
        Message::NoActiveEdit
      ) => "수정 중인 할 일이 없습니다.",
      | (Locale::En, Message::EmptyList) => {
        "No tasks yet. Add one to get started!"
      }
      | (Locale::Ko, Message::EmptyList) => {
        "할 일이 없습니다. 새로운 할 일을 추가해보세요!"
      }
    }
  }
}

/// User-facing strings the controller and renderer surface.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Message {
  EmptyText,
  MissingDate,
  ConfirmDelete,
  SaveFailed,
  NotFound,
  NoActiveEdit,
  EmptyList
}

impl FromStr for Locale {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "en" | "english" => Ok(Locale::En),
      | "ko" | "korean" => Ok(Locale::Ko),
      | other => {
        Err(anyhow!(
          "unknown locale: {other}"
        ))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{
    Locale,
    Message
  };

  #[test]
  fn parses_locale_names() {
    assert_eq!(
      "KO".parse::<Locale>()
        .expect("ko"),
      Locale::Ko
    );
    assert_eq!(
      "english"
        .parse::<Locale>()
        .expect("en"),
      Locale::En
    );
    assert!(
      "fr".parse::<Locale>().is_err()
    );
  }

  #[test]
  fn weekday_labels_start_on_sunday() {
    assert_eq!(
      Locale::En.weekday_labels()[0],
      "Sun"
    );
    assert_eq!(
      Locale::Ko.weekday_labels()[0],
      "일"
    );
  }

  #[test]
  fn korean_messages_match_prompts() {
    assert_eq!(
      Locale::Ko
        .message(Message::ConfirmDelete),
      "정말 삭제하시겠습니까?"
    );
  }
}
