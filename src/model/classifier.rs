// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/model/classifier.rs - 品种分类器
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

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  frame::{INPUT_HEIGHT, INPUT_WIDTH, RgbNhwcTensor},
  input::AsImage,
  model::{CONFIDENCE_THRESHOLD, Classification, Engine, LabelTable, Model},
};

pub type ModelTensor = RgbNhwcTensor<INPUT_WIDTH, INPUT_HEIGHT>;

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("模型输入形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InputShapeMismatch {
    expected: [usize; 4],
    actual: Vec<usize>,
  },
  #[error("标签数量与模型输出不匹配: 标签 {labels} 个, 输出 {outputs} 个")]
  LabelCountMismatch { labels: usize, outputs: usize },
  #[error("模型输出长度错误: 期望 {expected}, 实际 {actual}")]
  OutputLengthMismatch { expected: usize, actual: usize },
  #[error("置信度阈值无效: {0}")]
  InvalidThreshold(f64),
  #[error("输入图像为空: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
  #[error("推理引擎错误: {0}")]
  EngineError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 持有推理引擎与标签表，将图像转换为品种名称。
///
/// 构造时校验引擎输入形状为 `[1, 224, 224, 3]`、标签数量等于输出长度，
/// 之后的每次分类都不会再出现形状问题。
pub struct Classifier<E> {
  engine: E,
  labels: LabelTable,
  threshold: f64,
}

impl<E: Engine> Classifier<E> {
  pub fn new(engine: E, labels: LabelTable) -> Result<Self, ClassifierError> {
    let expected = ModelTensor::shape();
    let actual = engine.input_shape();
    if actual != expected {
      error!("预期模型输入形状为 {:?}, 实际为 {:?}", expected, actual);
      return Err(ClassifierError::InputShapeMismatch {
        expected,
        actual: actual.to_vec(),
      });
    }

    let outputs = engine.output_len();
    if outputs != labels.len() {
      error!(
        "标签数量 {} 与模型输出长度 {} 不一致",
        labels.len(),
        outputs
      );
      return Err(ClassifierError::LabelCountMismatch {
        labels: labels.len(),
        outputs,
      });
    }

    info!("分类器就绪，共 {} 个类别", labels.len());
    Ok(Classifier {
      engine,
      labels,
      threshold: CONFIDENCE_THRESHOLD,
    })
  }

  pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ClassifierError> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
      return Err(ClassifierError::InvalidThreshold(threshold));
    }
    self.threshold = threshold;
    Ok(self)
  }

  pub fn threshold(&self) -> f64 {
    self.threshold
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  pub fn preprocess(&self, image: &DynamicImage) -> Result<ModelTensor, ClassifierError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
      return Err(ClassifierError::EmptyImage { width, height });
    }

    debug!("预处理图像 {}x{} -> {}x{}", width, height, INPUT_WIDTH, INPUT_HEIGHT);
    Ok(ModelTensor::from_image(image))
  }

  pub fn postprocess(&self, scores: &[f32]) -> Result<Classification, ClassifierError> {
    if scores.len() != self.labels.len() {
      return Err(ClassifierError::OutputLengthMismatch {
        expected: self.labels.len(),
        actual: scores.len(),
      });
    }
    Ok(decode_scores(scores, &self.labels, self.threshold))
  }

  pub fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifierError> {
    let tensor = self.preprocess(image)?;

    debug!("执行模型推理");
    let scores = self
      .engine
      .run(tensor.as_nhwc())
      .map_err(|e| ClassifierError::EngineError(Box::new(e)))?;

    let result = self.postprocess(&scores)?;
    debug!("分类结果: {:?}", result);
    Ok(result)
  }
}

impl<E: Engine, F: AsImage> Model<F> for Classifier<E> {
  type Output = Classification;
  type Error = ClassifierError;

  fn infer(&self, input: &F) -> Result<Self::Output, Self::Error> {
    self.classify(input.as_image())
  }
}

/// 单次扫描取最高分，严格大于比较使并列时保留较小下标。
/// 最高分低于 `threshold` 时返回无法识别，比较在 f64 下进行，
/// 因此 `0.01f32`（略小于 0.01）不会被识别。
pub fn decode_scores(scores: &[f32], labels: &LabelTable, threshold: f64) -> Classification {
  let mut best_score = f32::NEG_INFINITY;
  let mut best_index = None;

  for (i, &score) in scores.iter().enumerate() {
    if score > best_score {
      best_score = score;
      best_index = Some(i);
    }
  }

  match best_index.and_then(|i| labels.display_name(i).map(|label| (i, label))) {
    Some((index, label)) if f64::from(best_score) >= threshold => Classification::Breed {
      label,
      index,
      score: best_score,
    },
    _ => Classification::NotRecognized {
      score: if best_index.is_some() { best_score } else { 0.0 },
    },
  }
}
