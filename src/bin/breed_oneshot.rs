// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/bin/breed_oneshot.rs - 单张图像品种识别
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use tracing::info;
use whatsmydog::{
  FromUrl,
  input::InputWrapper,
  model::ClassifierBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

/// WhatsMyDog 单张识别参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// TFLite 模型路径，如 tflite:///models/mobilenetv2_model.tflite
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 标签文件路径（默认为模型同目录下的 labels.txt）
  #[arg(long, value_name = "LABELS")]
  pub labels: Option<PathBuf>,
  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub threshold: Option<f64>,
  /// 输入来源，如 image:///photos/rex.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出方式
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Url,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出方式: {}", args.output);

  let mut builder = ClassifierBuilder::from_url(&args.model)?;
  if let Some(labels) = args.labels {
    builder = builder.labels(labels);
  }
  if let Some(threshold) = args.threshold {
    builder = builder.threshold(threshold);
  }

  let input = InputWrapper::from_url(&args.input)?;
  let model = builder.build()?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, model, output)?;

  Ok(())
}
