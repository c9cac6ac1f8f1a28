// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use url::Url;

use crate::FromUrl;
use crate::FromUrlWithScheme;
use crate::input::AsImage;
use crate::model::Classification;

/// 分类进行中 / 空闲，调用方据此屏蔽新的输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Busy,
  Idle,
}

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;

  fn render_status(&self, _frame: &Frame, _status: Status) -> Result<(), Self::Error> {
    Ok(())
  }
}

mod log_output;
pub use self::log_output::{LogOutput, LogOutputError};

#[cfg(feature = "console_output")]
mod console_output;
#[cfg(feature = "console_output")]
pub use self::console_output::{ConsoleFormat, ConsoleOutput, ConsoleOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "console_output")]
  #[error("控制台输出错误: {0}")]
  ConsoleOutputError(#[from] ConsoleOutputError),
  #[error("日志输出错误: {0}")]
  LogOutputError(#[from] LogOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  #[cfg(feature = "console_output")]
  ConsoleOutput(ConsoleOutput),
  LogOutput(LogOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "console_output")]
      ConsoleOutput::SCHEME => {
        let output = ConsoleOutput::from_url(url)?;
        Ok(OutputWrapper::ConsoleOutput(output))
      }
      LogOutput::SCHEME => {
        let output = LogOutput::from_url(url)?;
        Ok(OutputWrapper::LogOutput(output))
      }
      scheme => Err(OutputError::SchemeMismatch(scheme.to_string())),
    }
  }
}

impl<F: AsImage> Render<F, Classification> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &F, result: &Classification) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "console_output")]
      OutputWrapper::ConsoleOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::LogOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }

  fn render_status(&self, frame: &F, status: Status) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "console_output")]
      OutputWrapper::ConsoleOutput(output) => output
        .render_status(frame, status)
        .map_err(OutputError::from),
      OutputWrapper::LogOutput(output) => output
        .render_status(frame, status)
        .map_err(OutputError::from),
    }
  }
}
