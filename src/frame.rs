// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/frame.rs - NHWC 输入张量定义
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

use image::{DynamicImage, RgbImage, imageops::FilterType};

pub const RGB_CHANNELS: usize = 3;
pub const BATCH_SIZE: usize = 1;

/// 模型输入宽度
pub const INPUT_WIDTH: u32 = 224;
/// 模型输入高度
pub const INPUT_HEIGHT: u32 = 224;

/// 形状为 `[1, H, W, 3]` 的浮点输入张量，每个元素为 0-255 的通道强度
#[derive(Debug, Clone)]
pub struct RgbNhwcTensor<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> Default for RgbNhwcTensor<W, H> {
  fn default() -> Self {
    let size = BATCH_SIZE * RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0f32; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> RgbNhwcTensor<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn shape() -> [usize; 4] {
    [BATCH_SIZE, H as usize, W as usize, RGB_CHANNELS]
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn as_nhwc(&self) -> &[f32] {
    &self.data
  }

  /// 将任意尺寸的图像缩放为 W×H（最近邻采样，不保持宽高比），再逐像素填充。
  /// 透明通道被丢弃。
  pub fn from_image(image: &DynamicImage) -> Self {
    let resized = if image.width() == W && image.height() == H {
      image.to_rgb8()
    } else {
      image.resize_exact(W, H, FilterType::Nearest).to_rgb8()
    };

    let mut tensor = Self::default();
    tensor.fill(&resized);
    tensor
  }

  fn fill(&mut self, image: &RgbImage) {
    debug_assert_eq!(image.dimensions(), (W, H));

    let channels = self.channels();
    let width = self.width();
    let slice = &mut self.data;

    for (x, y, pixel) in image.enumerate_pixels() {
      let base = (y as usize) * width * channels + (x as usize) * channels;
      for c in 0..channels {
        slice[base + c] = pixel[c] as f32;
      }
    }
  }
}
