// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// tests/pipeline.rs - 输入 → 分类 → 输出 流程测试
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

use std::cell::RefCell;

use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;
use url::Url;

use whatsmydog::{
  FromUrl,
  input::{AsImage, CapturedImage, InputWrapper},
  model::{Classification, Classifier, Engine, LabelTable, NOT_RECOGNIZED},
  output::{Render, Status},
  task::{ContinuousTask, OneShotTask, RepeatShotTask, Task},
};

#[derive(Error, Debug)]
#[error("never fails")]
struct Infallible;

/// 以图像平均红色分量决定得分：偏红判为 golden_retriever，偏蓝判为 poodle，
/// 灰色图像得分全部低于阈值
struct ColourEngine;

impl Engine for ColourEngine {
  type Error = Infallible;

  fn input_shape(&self) -> &[usize] {
    &[1, 224, 224, 3]
  }

  fn output_len(&self) -> usize {
    3
  }

  fn run(&self, input: &[f32]) -> Result<Box<[f32]>, Self::Error> {
    let pixels = (input.len() / 3) as f32;
    let (mut r, mut b) = (0f32, 0f32);
    for px in input.chunks_exact(3) {
      r += px[0];
      b += px[2];
    }
    let (r, b) = (r / pixels / 255.0, b / pixels / 255.0);
    let scores = if (r - b).abs() < 0.1 {
      vec![0.005, 0.004, 0.001]
    } else if r > b {
      vec![0.82, 0.10, 0.08]
    } else {
      vec![0.10, 0.85, 0.05]
    };
    Ok(scores.into_boxed_slice())
  }
}

fn classifier() -> Classifier<ColourEngine> {
  let labels = LabelTable::parse("golden_retriever\npoodle\nnot_a_dog\n").unwrap();
  Classifier::new(ColourEngine, labels).unwrap()
}

#[derive(Default)]
struct Collect {
  lines: RefCell<Vec<String>>,
  busy: RefCell<usize>,
}

impl<F: AsImage> Render<F, Classification> for &Collect {
  type Error = Infallible;

  fn render_result(&self, frame: &F, result: &Classification) -> Result<(), Self::Error> {
    let name = std::path::Path::new(frame.source())
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    self.lines.borrow_mut().push(format!("{}: {}", name, result));
    Ok(())
  }

  fn render_status(&self, _frame: &F, status: Status) -> Result<(), Self::Error> {
    if status == Status::Busy {
      *self.busy.borrow_mut() += 1;
    }
    Ok(())
  }
}

fn solid(colour: [u8; 3]) -> RgbImage {
  RgbImage::from_pixel(320, 240, Rgb(colour))
}

#[test]
fn end_to_end_examples() {
  let classifier = classifier();

  let red = DynamicImage::ImageRgb8(solid([220, 40, 30]));
  assert_eq!(classifier.classify(&red).unwrap().to_string(), "golden retriever");

  let grey = DynamicImage::ImageRgb8(solid([128, 128, 128]));
  assert_eq!(classifier.classify(&grey).unwrap().to_string(), NOT_RECOGNIZED);
}

#[test]
fn folder_input_is_classified_in_order() {
  let dir = tempfile::tempdir().unwrap();
  solid([230, 20, 20]).save(dir.path().join("01-red.png")).unwrap();
  std::fs::write(dir.path().join("02-broken.jpg"), b"not an image").unwrap();
  solid([20, 20, 230]).save(dir.path().join("03-blue.png")).unwrap();
  solid([90, 90, 90]).save(dir.path().join("04-grey.png")).unwrap();

  let url = Url::from_directory_path(dir.path()).unwrap();
  let url = Url::parse(&url.as_str().replacen("file:", "folder:", 1)).unwrap();
  let input = InputWrapper::from_url(&url).unwrap();

  let collect = Collect::default();
  ContinuousTask::default()
    .run_task(input, classifier(), &collect)
    .unwrap();

  assert_eq!(
    *collect.lines.borrow(),
    vec![
      "01-red.png: golden retriever",
      "03-blue.png: poodle",
      "04-grey.png: Not recognized.",
    ]
  );
  assert_eq!(*collect.busy.borrow(), 3);
}

#[test]
fn single_image_input_runs_one_shot() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("rex.png");
  solid([10, 10, 200]).save(&path).unwrap();

  let url = Url::parse(&format!("image://{}", path.display())).unwrap();
  let input = InputWrapper::from_url(&url).unwrap();

  let collect = Collect::default();
  OneShotTask.run_task(input, classifier(), &collect).unwrap();

  assert_eq!(*collect.lines.borrow(), vec!["rex.png: poodle"]);
}

#[test]
fn repeated_classification_is_stable() {
  let frame = CapturedImage {
    source: "rex.png".to_string(),
    image: DynamicImage::ImageRgb8(solid([200, 30, 30])),
  };
  let input = vec![Ok::<_, Infallible>(frame)].into_iter();

  let collect = Collect::default();
  RepeatShotTask::default()
    .with_repeat_times(3)
    .run_task(input, classifier(), &collect)
    .unwrap();

  let lines = collect.lines.borrow();
  assert_eq!(lines.len(), 3);
  assert!(lines.iter().all(|l| l == "rex.png: golden retriever"));
}
