// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/output/log_output.rs - 日志输出
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
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::AsImage,
  model::Classification,
  output::{Render, Status},
};

#[derive(Error, Debug)]
pub enum LogOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 通过 tracing 记录分类结果与忙闲状态
#[derive(Debug, Default)]
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LogOutputError::SchemeMismatch);
    }
    Ok(LogOutput)
  }
}

impl<F: AsImage> Render<F, Classification> for LogOutput {
  type Error = LogOutputError;

  fn render_result(&self, frame: &F, result: &Classification) -> Result<(), Self::Error> {
    match result {
      Classification::Breed {
        label,
        index,
        score,
      } => info!(
        "{}: Breed: {} (#{}, {:.2}%)",
        frame.source(),
        label,
        index,
        score * 100.0
      ),
      Classification::NotRecognized { score } => warn!(
        "{}: Breed: {} (最高分 {:.4})",
        frame.source(),
        result,
        score
      ),
    }
    Ok(())
  }

  fn render_status(&self, frame: &F, status: Status) -> Result<(), Self::Error> {
    match status {
      Status::Busy => debug!("{}: 识别中...", frame.source()),
      Status::Idle => debug!("{}: 识别结束", frame.source()),
    }
    Ok(())
  }
}
