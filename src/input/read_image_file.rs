// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::CapturedImage, url_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(image::ImageError),
}

impl From<std::io::Error> for ImageFileInputError {
  fn from(err: std::io::Error) -> Self {
    ImageFileInputError::IoError(err)
  }
}

impl From<image::ImageError> for ImageFileInputError {
  fn from(err: image::ImageError) -> Self {
    ImageFileInputError::ImageLoadError(err)
  }
}

/// 单张图片（相当于从相册选中一张照片），构造时即完成解码
pub struct ImageFileInput {
  image: Option<CapturedImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_path(url);
    let image = ImageReader::open(&path)?
      .with_guessed_format()?
      .decode()
      .inspect_err(|e| error!("无法解码图像 {}: {}", path.display(), e))?;
    debug!("图像 {} 尺寸: {}x{}", path.display(), image.width(), image.height());

    Ok(ImageFileInput {
      image: Some(CapturedImage {
        source: path.display().to_string(),
        image,
      }),
    })
  }
}

impl ImageFileInput {
  /// 从内存中已编码的图片数据构造
  pub fn from_bytes(source: &str, bytes: &[u8]) -> Result<Self, ImageFileInputError> {
    let image = image::load_from_memory(bytes)?;
    Ok(ImageFileInput {
      image: Some(CapturedImage {
        source: source.to_string(),
        image,
      }),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = Result<CapturedImage, ImageFileInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take().map(Ok)
  }
}
