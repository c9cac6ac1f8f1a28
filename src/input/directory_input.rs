// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/input/directory_input.rs - 目录批量输入
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

use std::{collections::VecDeque, path::PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{CapturedImage, has_supported_extension},
  url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像 {path:?} 解码失败: {source}")]
  DecodeError {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },
}

/// 依文件名顺序逐张读取目录中的图片，解码延迟到迭代时进行
pub struct DirectoryInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = DirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryInputError::SchemeMismatch);
    }
    Self::open(url_path(url))
  }
}

impl DirectoryInput {
  pub fn open<P: Into<PathBuf>>(directory: P) -> Result<Self, DirectoryInputError> {
    let directory = directory.into();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if path.is_file() && has_supported_extension(&path) {
        files.push(path);
      } else {
        debug!("跳过非图片条目: {}", path.display());
      }
    }
    files.sort();

    info!("目录 {} 中共有 {} 张图片", directory.display(), files.len());
    Ok(DirectoryInput {
      pending: files.into(),
    })
  }

  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for DirectoryInput {
  type Item = Result<CapturedImage, DirectoryInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    let path = self.pending.pop_front()?;
    let result = image::open(&path)
      .map(|image| CapturedImage {
        source: path.display().to_string(),
        image,
      })
      .map_err(|source| {
        warn!("图像 {} 解码失败: {}", path.display(), source);
        DirectoryInputError::DecodeError {
          path: path.clone(),
          source,
        }
      });
    Some(result)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.pending.len(), Some(self.pending.len()))
  }
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use super::*;

  #[test]
  fn lists_images_in_name_order_and_skips_others() {
    let dir = tempfile::tempdir().unwrap();
    RgbImage::from_pixel(2, 2, Rgb([1, 1, 1]))
      .save(dir.path().join("b.png"))
      .unwrap();
    RgbImage::from_pixel(2, 2, Rgb([2, 2, 2]))
      .save(dir.path().join("a.png"))
      .unwrap();
    std::fs::write(dir.path().join("labels.txt"), "beagle").unwrap();
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let input = DirectoryInput::open(dir.path()).unwrap();
    assert_eq!(input.remaining(), 2);

    let sources: Vec<String> = input.map(|r| r.unwrap().source).collect();
    assert!(sources[0].ends_with("a.png"));
    assert!(sources[1].ends_with("b.png"));
  }

  #[test]
  fn broken_file_yields_error_and_iteration_continues() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.jpg"), b"broken").unwrap();
    RgbImage::from_pixel(2, 2, Rgb([3, 3, 3]))
      .save(dir.path().join("b.png"))
      .unwrap();

    let mut input = DirectoryInput::open(dir.path()).unwrap();
    assert!(matches!(
      input.next(),
      Some(Err(DirectoryInputError::DecodeError { .. }))
    ));
    assert!(input.next().unwrap().is_ok());
    assert!(input.next().is_none());
  }

  #[test]
  fn missing_directory_is_an_io_error() {
    let url = Url::parse("folder:///nonexistent/photos").unwrap();
    assert!(matches!(
      DirectoryInput::from_url(&url),
      Err(DirectoryInputError::IoError(_))
    ));
  }
}
