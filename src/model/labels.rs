// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/model/labels.rs - 标签表
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

use std::path::Path;

use thiserror::Error;
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("标签文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件为空")]
  Empty,
}

/// 按模型输出下标排列的品种名称，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  labels: Box<[String]>,
}

impl LabelTable {
  /// 每行一个标签，行号即输出下标。空行同样占用一个下标。
  pub fn parse(text: &str) -> Result<Self, LabelError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let labels: Box<[String]> = text.lines().map(str::to_string).collect();

    if labels.is_empty() {
      return Err(LabelError::Empty);
    }

    debug!("读取到 {} 个标签", labels.len());
    Ok(LabelTable { labels })
  }

  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let text = std::fs::read_to_string(path)?;
    Self::parse(&text)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.labels.get(index).map(String::as_str)
  }

  /// 供展示的名称：下划线替换为空格
  pub fn display_name(&self, index: usize) -> Option<String> {
    self.get(index).map(|label| label.replace('_', " "))
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.labels.iter().map(String::as_str)
  }
}
