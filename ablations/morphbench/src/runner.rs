//! 程序运行函数.

use crate::phantom;
use crate::result::{BenchRecord, BenchResult};
use rt_berry::prelude::*;
use std::thread;
use std::time::Instant;

/// 评估的 margin 档位 (毫米).
const MARGINS_MM: [f64; 4] = [-5.0, -2.5, 2.5, 5.0];

/// 工作网格的逐轴间距 (毫米).
const SPACING: Mm3 = (1.0, 1.0, 1.0);

/// 实际运行: 对每个模体、每个 margin 档位, 并行评估两种形态学策略.
pub fn run() -> BenchResult {
    let phantoms: [(&str, Vec<Contour>); 2] = [
        ("sphere-r15", phantom::sphere(15.0)),
        ("cube-e20", phantom::cube(20.0)),
    ];

    println!("Running morphology ablation studies...");
    let mut records = Vec::new();
    for (name, contours) in &phantoms {
        let base = phantom::evaluate_count(contours);
        for margin_mm in MARGINS_MM {
            // 两种策略在作用域线程上并行运行 (互相独立, 无共享状态).
            let (exact, approx) = thread::scope(|s| {
                let exact = s.spawn(|| timed(contours, margin_mm, MorphologyStrategy::Exact));
                let approx =
                    s.spawn(|| timed(contours, margin_mm, MorphologyStrategy::SeparableApprox));
                (
                    exact.join().expect("Thread joining error"),
                    approx.join().expect("Thread joining error"),
                )
            });

            records.push(BenchRecord {
                phantom: *name,
                margin_mm,
                base_count: base,
                exact_count: exact.0,
                exact_us: exact.1,
                approx_count: approx.0,
                approx_us: approx.1,
            });
        }
    }
    BenchResult::from_records(records)
}

/// 运行单个策略并计时. 返回 (评估体素数, 耗时微秒).
fn timed(contours: &[Contour], margin_mm: f64, strategy: MorphologyStrategy) -> (usize, u64) {
    let clock = Instant::now();
    let grown = apply_3d_margin(contours, margin_mm, SPACING, strategy);
    let elapsed = clock.elapsed().as_micros() as u64;
    (phantom::evaluate_count(&grown), elapsed)
}
