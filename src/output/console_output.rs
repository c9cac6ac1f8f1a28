// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/output/console_output.rs - 控制台输出
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::io::Write;

use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::AsImage,
  model::Classification,
  output::{Render, Status},
  query_flag, query_value,
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("不支持的输出格式: {0}")]
  UnknownFormat(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
  /// `Breed: <label>`
  #[default]
  Text,
  /// 每行一个 JSON 对象
  Json,
}

/// 将分类结果打印到标准输出。
///
/// `console:?format=json` 输出 JSON 行；文本格式下 `?score` 追加置信度，
/// `?source` 在行首加上图像来源，`?progress` 在标准错误上提示忙闲状态。
#[derive(Debug, Default)]
pub struct ConsoleOutput {
  format: ConsoleFormat,
  with_score: bool,
  with_source: bool,
  progress: bool,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(url.scheme().to_string()));
    }

    let format = match query_value(url, "format").as_deref() {
      None | Some("text") => ConsoleFormat::Text,
      Some("json") => ConsoleFormat::Json,
      Some(other) => return Err(ConsoleOutputError::UnknownFormat(other.to_string())),
    };

    Ok(ConsoleOutput {
      format,
      with_score: query_flag(url, "score"),
      with_source: query_flag(url, "source"),
      progress: query_flag(url, "progress"),
    })
  }
}

impl ConsoleOutput {
  pub fn format_line<F: AsImage>(&self, frame: &F, result: &Classification) -> String {
    match self.format {
      ConsoleFormat::Json => json!({
        "source": frame.source(),
        "label": result.label(),
        "recognized": result.is_recognized(),
        "index": result.index(),
        "score": result.score(),
      })
      .to_string(),
      ConsoleFormat::Text => {
        let mut line = String::new();
        if self.with_source {
          line.push_str(frame.source());
          line.push_str(": ");
        }
        line.push_str("Breed: ");
        line.push_str(result.label());
        if self.with_score && result.is_recognized() {
          line.push_str(&format!(" ({:.2}%)", result.score() * 100.0));
        }
        line
      }
    }
  }
}

impl<F: AsImage> Render<F, Classification> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &F, result: &Classification) -> Result<(), Self::Error> {
    let line = self.format_line(frame, result);
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
  }

  fn render_status(&self, frame: &F, status: Status) -> Result<(), Self::Error> {
    if self.progress && status == Status::Busy {
      writeln!(std::io::stderr(), "识别中: {}", frame.source())?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use image::DynamicImage;

  use super::*;
  use crate::input::CapturedImage;

  fn frame() -> CapturedImage {
    CapturedImage {
      source: "photos/rex.jpg".to_string(),
      image: DynamicImage::new_rgb8(1, 1),
    }
  }

  fn golden() -> Classification {
    Classification::Breed {
      label: "golden retriever".to_string(),
      index: 0,
      score: 0.82,
    }
  }

  fn output(url: &str) -> ConsoleOutput {
    ConsoleOutput::from_url(&Url::parse(url).unwrap()).unwrap()
  }

  #[test]
  fn plain_text_matches_display_text() {
    assert_eq!(
      output("console:").format_line(&frame(), &golden()),
      "Breed: golden retriever"
    );
    assert_eq!(
      output("console:").format_line(&frame(), &Classification::NotRecognized { score: 0.005 }),
      "Breed: Not recognized."
    );
  }

  #[test]
  fn text_flags_add_source_and_score() {
    assert_eq!(
      output("console:?source&score").format_line(&frame(), &golden()),
      "photos/rex.jpg: Breed: golden retriever (82.00%)"
    );
  }

  #[test]
  fn json_lines_carry_every_field() {
    let line = output("console:?format=json").format_line(&frame(), &golden());
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();

    assert_eq!(value["source"], "photos/rex.jpg");
    assert_eq!(value["label"], "golden retriever");
    assert_eq!(value["recognized"], true);
    assert_eq!(value["index"], 0);

    let line = output("console:?format=json")
      .format_line(&frame(), &Classification::NotRecognized { score: 0.001 });
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["label"], "Not recognized.");
    assert!(value["index"].is_null());
  }

  #[test]
  fn unknown_format_is_rejected() {
    let url = Url::parse("console:?format=xml").unwrap();
    assert!(matches!(
      ConsoleOutput::from_url(&url),
      Err(ConsoleOutputError::UnknownFormat(_))
    ));
  }
}
