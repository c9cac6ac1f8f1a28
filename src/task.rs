// 该文件是 WhatsMyDog （汪汪识犬） 项目的一部分。
// src/task.rs - 任务
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

use std::{
  sync::mpsc::{Receiver, channel},
  thread,
  time::{Duration, Instant},
};
use tracing::{error, info, warn};

use crate::{
  model::Model,
  output::{Render, Status},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 单张图像的完整流程：忙 → 推理 → 闲 → 渲染结果。
/// 推理失败时同样恢复为空闲状态。
fn classify_frame<F, D, ME, RE, M, O>(model: &M, output: &O, frame: &F) -> anyhow::Result<D>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
{
  output.render_status(frame, Status::Busy)?;
  let result = model.infer(frame);
  output.render_status(frame, Status::Idle)?;
  let result = result?;
  output.render_result(frame, &result)?;
  Ok(result)
}

pub struct OneShotTask;

impl<F, D, IE, ME, RE, I, M, O> Task<I, M, O> for OneShotTask
where
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<F, IE>>,
  M: Model<F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    info!("输入图像获取成功，开始推理...");
    let now = Instant::now();
    classify_frame(&model, &output, &frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 对同一张图像重复推理，统计耗时并校验结果一致
#[derive(Debug)]
pub struct RepeatShotTask {
  repeat_times: usize,
}

const DEFAULT_REPEAT_TIMES: usize = 100;
const WARMUP_TIMES: usize = 2;

impl Default for RepeatShotTask {
  fn default() -> Self {
    RepeatShotTask {
      repeat_times: DEFAULT_REPEAT_TIMES,
    }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(1);
    self
  }
}

impl<F, D, IE, ME, RE, I, M, O> Task<I, M, O> for RepeatShotTask
where
  D: PartialEq + std::fmt::Debug,
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<F, IE>>,
  M: Model<F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    info!("输入图像获取成功，开始推理...");

    let mut times = Vec::with_capacity(self.repeat_times);
    let mut first: Option<D> = None;
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = classify_frame(&model, &output, &frame)?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);

      if first.is_none() {
        first = Some(result);
      } else if first.as_ref() != Some(&result) {
        error!("第 {} 次推理结果不一致: {:?} != {:?}", i, result, first);
        anyhow::bail!("重复推理结果不一致: {:?} != {:?}", result, first);
      }
    }

    let measured = if times.len() > WARMUP_TIMES {
      &times[WARMUP_TIMES..]
    } else {
      &times[..]
    };
    warn!(
      "平均推理时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );

    Ok(())
  }
}

/// 逐张处理输入，直到输入耗尽、达到数量上限或收到中断信号。
/// 中断只在两张图像之间生效。
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  stop: Option<Receiver<()>>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 安装 Ctrl-C 处理。每个进程只能调用一次。
  pub fn with_ctrlc(mut self) -> Result<Self, ctrlc::Error> {
    let (tx, rx) = channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，当前图像处理完成后退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
    self.stop = Some(rx);
    Ok(self)
  }

  fn interrupted(&self) -> bool {
    self
      .stop
      .as_ref()
      .map(|rx| rx.try_recv().is_ok())
      .unwrap_or(false)
  }
}

impl<F, D, IE, ME, RE, I, M, O> Task<I, M, O> for ContinuousTask
where
  IE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<F, IE>>,
  M: Model<F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");

    let mut frame_index = 0usize;
    let mut failed = 0usize;
    for frame in input {
      frame_index += 1;
      info!("处理第 {} 张图像", frame_index);

      let frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
          warn!("第 {} 张图像读取失败，跳过: {}", frame_index, e);
          failed += 1;
          continue;
        }
      };

      let now = Instant::now();
      match classify_frame(&model, &output, &frame) {
        Ok(_) => info!("推理完成，耗时: {:.2?}", now.elapsed()),
        Err(e) => {
          error!("第 {} 张图像分类失败: {}", frame_index, e);
          failed += 1;
        }
      }

      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定数量 {}, 退出任务循环", frame_index);
        break;
      }
      if self.interrupted() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共 {} 张，失败 {} 张", frame_index, failed);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::cell::{Cell, RefCell};

  use thiserror::Error;

  use super::*;

  #[derive(Error, Debug)]
  #[error("fake failure")]
  struct FakeError;

  /// 依次返回预设结果的假模型
  struct ScriptedModel {
    results: Vec<Result<u32, ()>>,
    calls: Cell<usize>,
  }

  impl ScriptedModel {
    fn new(results: Vec<Result<u32, ()>>) -> Self {
      ScriptedModel {
        results,
        calls: Cell::new(0),
      }
    }
  }

  impl Model<&'static str> for ScriptedModel {
    type Output = u32;
    type Error = FakeError;

    fn infer(&self, _input: &&'static str) -> Result<u32, FakeError> {
      let i = self.calls.get();
      self.calls.set(i + 1);
      self.results[i % self.results.len()].map_err(|_| FakeError)
    }
  }

  #[derive(Default)]
  struct Recorder {
    events: RefCell<Vec<String>>,
  }

  impl Render<&'static str, u32> for &Recorder {
    type Error = FakeError;

    fn render_result(&self, frame: &&'static str, result: &u32) -> Result<(), FakeError> {
      self.events.borrow_mut().push(format!("{}={}", frame, result));
      Ok(())
    }

    fn render_status(&self, frame: &&'static str, status: Status) -> Result<(), FakeError> {
      self.events.borrow_mut().push(format!("{}:{:?}", frame, status));
      Ok(())
    }
  }

  fn frames(names: &[&'static str]) -> std::vec::IntoIter<Result<&'static str, FakeError>> {
    names.iter().map(|name| Ok(*name)).collect::<Vec<_>>().into_iter()
  }

  #[test]
  fn one_shot_wraps_inference_in_busy_and_idle() {
    let recorder = Recorder::default();
    OneShotTask
      .run_task(frames(&["rex", "fido"]), ScriptedModel::new(vec![Ok(7)]), &recorder)
      .unwrap();

    assert_eq!(
      *recorder.events.borrow(),
      vec!["rex:Busy", "rex:Idle", "rex=7"]
    );
  }

  #[test]
  fn one_shot_without_input_fails() {
    let recorder = Recorder::default();
    let result = OneShotTask.run_task(frames(&[]), ScriptedModel::new(vec![Ok(1)]), &recorder);
    assert!(result.is_err());
  }

  #[test]
  fn failed_inference_still_returns_to_idle() {
    let recorder = Recorder::default();
    let result = OneShotTask.run_task(frames(&["rex"]), ScriptedModel::new(vec![Err(())]), &recorder);

    assert!(result.is_err());
    assert_eq!(*recorder.events.borrow(), vec!["rex:Busy", "rex:Idle"]);
  }

  #[test]
  fn repeat_shot_accepts_stable_results() {
    let recorder = Recorder::default();
    let model = ScriptedModel::new(vec![Ok(3)]);
    RepeatShotTask::default()
      .with_repeat_times(5)
      .run_task(frames(&["rex"]), &model, &recorder)
      .unwrap();

    assert_eq!(model.calls.get(), 5);
  }

  #[test]
  fn repeat_shot_rejects_unstable_results() {
    let recorder = Recorder::default();
    let result = RepeatShotTask::default().with_repeat_times(4).run_task(
      frames(&["rex"]),
      ScriptedModel::new(vec![Ok(3), Ok(4)]),
      &recorder,
    );
    assert!(result.is_err());
  }

  #[test]
  fn continuous_skips_failures_and_honours_limit() {
    let recorder = Recorder::default();
    let input = vec![Ok("a"), Err(FakeError), Ok("b"), Ok("c"), Ok("d")].into_iter();
    let model = ScriptedModel::new(vec![Ok(1), Err(()), Ok(2)]);

    ContinuousTask::default()
      .with_frame_number(Some(4))
      .run_task(input, &model, &recorder)
      .unwrap();

    // 第 4 张 ("c") 之后停止，"b" 推理失败不产生结果
    let events = recorder.events.borrow();
    assert!(events.contains(&"a=1".to_string()));
    assert!(!events.iter().any(|e| e.starts_with("b=")));
    assert!(events.contains(&"c=2".to_string()));
    assert!(!events.iter().any(|e| e.starts_with("d")));
  }
}
