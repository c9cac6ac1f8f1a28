// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/model.rs - 模型
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

use std::fmt;

/// 低于该分数的最高分视为无法识别
pub const CONFIDENCE_THRESHOLD: f64 = 0.01;

/// 无法识别时返回给调用方的字符串
pub const NOT_RECOGNIZED: &str = "Not recognized.";

pub trait Model<Input> {
  type Output;
  type Error;

  fn infer(&self, input: &Input) -> Result<Self::Output, Self::Error>;
}

impl<Input, M: Model<Input>> Model<Input> for &M {
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

/// 推理引擎：执行已训练网络的外部解释器。
///
/// 输入为按 [`Engine::input_shape`] 排布的浮点张量，输出为长度
/// [`Engine::output_len`] 的逐类别分数。同一实例不支持并发调用。
pub trait Engine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn input_shape(&self) -> &[usize];
  fn output_len(&self) -> usize;
  fn run(&self, input: &[f32]) -> Result<Box<[f32]>, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
  /// `label` 已将下划线替换为空格
  Breed {
    label: String,
    index: usize,
    score: f32,
  },
  NotRecognized {
    score: f32,
  },
}

impl Classification {
  pub fn label(&self) -> &str {
    match self {
      Classification::Breed { label, .. } => label,
      Classification::NotRecognized { .. } => NOT_RECOGNIZED,
    }
  }

  pub fn score(&self) -> f32 {
    match self {
      Classification::Breed { score, .. } | Classification::NotRecognized { score } => *score,
    }
  }

  pub fn index(&self) -> Option<usize> {
    match self {
      Classification::Breed { index, .. } => Some(*index),
      Classification::NotRecognized { .. } => None,
    }
  }

  pub fn is_recognized(&self) -> bool {
    matches!(self, Classification::Breed { .. })
  }
}

impl fmt::Display for Classification {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

mod labels;
pub use self::labels::{LabelError, LabelTable};

mod classifier;
pub use self::classifier::{Classifier, ClassifierError, ModelTensor, decode_scores};

#[cfg(feature = "model_tflite")]
mod tflite;
#[cfg(feature = "model_tflite")]
pub use self::tflite::{ClassifierBuilder, ClassifierBuilderError, TfliteEngine, TfliteError};
