// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/model/tflite.rs - TFLite 推理后端
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

use std::{io::Cursor, path::PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};
use tract_tflite::prelude::*;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{CONFIDENCE_THRESHOLD, Classifier, ClassifierError, Engine, LabelError, LabelTable},
  query_value, url_path,
};

const TFLITE_NUM_INPUTS: usize = 1;
const TFLITE_NUM_OUTPUTS: usize = 1;
const TFLITE_IDENTIFIER: &[u8; 4] = b"TFL3";
const DEFAULT_LABELS_FILENAME: &str = "labels.txt";

type TflitePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

#[derive(Error, Debug)]
pub enum TfliteError {
  #[error("模型数据中找不到 TFLite 标识 (TFL3)")]
  MissingIdentifier,
  #[error("预期模型输入数量为 1, 实际为 {0}")]
  InputCount(usize),
  #[error("预期模型输出数量为 1, 实际为 {0}")]
  OutputCount(usize),
  #[error("不支持的模型输入类型: {0:?}")]
  UnsupportedInputType(DatumType),
  #[error("模型输入形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InputShape {
    expected: [usize; 4],
    actual: Vec<usize>,
  },
  #[error("无法确定模型输出长度")]
  UnknownOutputShape,
  #[error("模型未产生输出")]
  NoOutput,
  #[error("TFLite 错误: {0}")]
  TractError(TractError),
}

impl From<TractError> for TfliteError {
  fn from(err: TractError) -> Self {
    TfliteError::TractError(err)
  }
}

/// 基于 tract 的 TFLite 解释器，输入输出均为 f32
pub struct TfliteEngine {
  plan: TflitePlan,
  input_shape: [usize; 4],
  output_len: usize,
}

impl TfliteEngine {
  pub fn load(model_bytes: &[u8], input_shape: [usize; 4]) -> Result<Self, TfliteError> {
    debug!(
      "模型文件大小: {:.2} MB",
      model_bytes.len() as f64 / (1024.0 * 1024.0)
    );
    let flatbuffer = find_tflite_slice(model_bytes).ok_or(TfliteError::MissingIdentifier)?;

    info!("解析 TFLite 模型");
    let mut cursor = Cursor::new(flatbuffer);
    let model = tract_tflite::tflite().model_for_read(&mut cursor)?;

    let num_inputs = model.input_outlets()?.len();
    let num_outputs = model.output_outlets()?.len();
    if num_inputs != TFLITE_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        TFLITE_NUM_INPUTS, num_inputs
      );
      return Err(TfliteError::InputCount(num_inputs));
    }
    if num_outputs != TFLITE_NUM_OUTPUTS {
      error!(
        "预期模型输出数量为 {}, 实际为 {}",
        TFLITE_NUM_OUTPUTS, num_outputs
      );
      return Err(TfliteError::OutputCount(num_outputs));
    }

    let inlet = model.input_outlets()?[0];
    let fact = model.outlet_fact(inlet)?;
    debug!("模型原始输入: {:?}", fact);
    if fact.datum_type != f32::datum_type() {
      error!("模型输入类型为 {:?}, 仅支持 f32", fact.datum_type);
      return Err(TfliteError::UnsupportedInputType(fact.datum_type));
    }
    if let Some(actual) = fact.shape.as_concrete()
      && actual != input_shape
    {
      error!("预期模型输入形状为 {:?}, 实际为 {:?}", input_shape, actual);
      return Err(TfliteError::InputShape {
        expected: input_shape,
        actual: actual.to_vec(),
      });
    }

    let [n, h, w, c] = input_shape;
    let model = model
      .with_input_fact(0, TypedFact::dt_shape(f32::datum_type(), tvec!(n, h, w, c)))?
      .into_optimized()?;

    let outlet = model.output_outlets()?[0];
    let output_len = model
      .outlet_fact(outlet)?
      .shape
      .as_concrete()
      .map(|shape| shape.iter().product::<usize>())
      .ok_or(TfliteError::UnknownOutputShape)?;
    debug!("模型输出长度: {}", output_len);

    let plan = model.into_runnable()?;
    info!("模型加载完成");

    Ok(TfliteEngine {
      plan,
      input_shape,
      output_len,
    })
  }
}

impl Engine for TfliteEngine {
  type Error = TfliteError;

  fn input_shape(&self) -> &[usize] {
    &self.input_shape
  }

  fn output_len(&self) -> usize {
    self.output_len
  }

  fn run(&self, input: &[f32]) -> Result<Box<[f32]>, Self::Error> {
    let tensor = Tensor::from_shape(&self.input_shape, input)?;
    let outputs = self.plan.run(tvec!(tensor.into()))?;
    let output = outputs.first().ok_or(TfliteError::NoOutput)?;
    let scores = output.to_array_view::<f32>()?;
    Ok(scores.iter().copied().collect())
  }
}

/// 模型文件可能带有打包头，定位 flatbuffer 标识所在的起点
fn find_tflite_slice(buf: &[u8]) -> Option<&[u8]> {
  if buf.len() < 8 {
    return None;
  }
  (0..=buf.len() - 8)
    .find(|&i| &buf[i + 4..i + 8] == TFLITE_IDENTIFIER)
    .map(|i| &buf[i..])
}

impl Classifier<TfliteEngine> {
  /// 解析标签文本并加载模型。任何失败都意味着打包损坏，不会重试。
  pub fn initialize(model_bytes: &[u8], label_lines: &str) -> Result<Self, ClassifierBuilderError> {
    let labels = LabelTable::parse(label_lines).inspect_err(|e| error!("标签解析失败: {}", e))?;
    Self::with_labels(model_bytes, labels)
  }

  pub fn with_labels(model_bytes: &[u8], labels: LabelTable) -> Result<Self, ClassifierBuilderError> {
    let engine = TfliteEngine::load(model_bytes, crate::model::ModelTensor::shape())
      .inspect_err(|e| error!("模型加载失败: {}", e))?;
    Ok(Classifier::new(engine, labels)?)
  }
}

#[derive(Error, Debug)]
pub enum ClassifierBuilderError {
  #[error("模型路径必须使用 tflite 方案, 实际为 {0}")]
  SchemeMismatch(String),
  #[error("阈值参数无效: {0}")]
  InvalidThreshold(String),
  #[error("模型文件读取错误 {0:?}: {1}")]
  ModelLoadError(PathBuf, std::io::Error),
  #[error("标签错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("TFLite 错误: {0}")]
  TfliteError(#[from] TfliteError),
  #[error("分类器错误: {0}")]
  ClassifierError(#[from] ClassifierError),
}

/// 由 `tflite:///path/model.tflite?labels=/path/labels.txt&threshold=0.01` 构建分类器
#[derive(Debug, Clone)]
pub struct ClassifierBuilder {
  model_path: PathBuf,
  labels_path: PathBuf,
  threshold: f64,
}

impl FromUrlWithScheme for ClassifierBuilder {
  const SCHEME: &'static str = "tflite";
}

impl FromUrl for ClassifierBuilder {
  type Error = ClassifierBuilderError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ClassifierBuilderError::SchemeMismatch(
        url.scheme().to_string(),
      ));
    }

    let model_path = url_path(url);
    let labels_path = match query_value(url, "labels") {
      Some(path) => PathBuf::from(path),
      None => model_path.with_file_name(DEFAULT_LABELS_FILENAME),
    };
    let threshold = match query_value(url, "threshold") {
      Some(value) => value
        .parse::<f64>()
        .map_err(|_| ClassifierBuilderError::InvalidThreshold(value))?,
      None => CONFIDENCE_THRESHOLD,
    };

    Ok(ClassifierBuilder {
      model_path,
      labels_path,
      threshold,
    })
  }
}

impl ClassifierBuilder {
  pub fn labels<P: Into<PathBuf>>(mut self, path: P) -> Self {
    self.labels_path = path.into();
    self
  }

  pub fn threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn model_path(&self) -> &std::path::Path {
    &self.model_path
  }

  pub fn labels_path(&self) -> &std::path::Path {
    &self.labels_path
  }

  pub fn build(self) -> Result<Classifier<TfliteEngine>, ClassifierBuilderError> {
    info!("加载模型文件: {}", self.model_path.display());
    let model_bytes = std::fs::read(&self.model_path).map_err(|e| {
      error!("无法读取模型文件 {}: {}", self.model_path.display(), e);
      ClassifierBuilderError::ModelLoadError(self.model_path.clone(), e)
    })?;

    info!("加载标签文件: {}", self.labels_path.display());
    let labels = LabelTable::from_path(&self.labels_path)
      .inspect_err(|e| error!("无法读取标签文件 {}: {}", self.labels_path.display(), e))?;

    let classifier = Classifier::with_labels(&model_bytes, labels)?;
    Ok(classifier.with_threshold(self.threshold)?)
  }
}
