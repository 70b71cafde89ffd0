//! 实验结果.

use std::io::{self, Write};

const SEP: &str = "--------------------------------------------------------";

/// 单条 (模体, margin, 策略对) 的实验记录.
pub struct BenchRecord {
    /// 模体名.
    pub phantom: &'static str,

    /// margin 档位 (毫米).
    pub margin_mm: f64,

    /// 模体在评估网格上的初始体素数.
    pub base_count: usize,

    /// Exact 策略结果体素数.
    pub exact_count: usize,

    /// Exact 策略耗时 (微秒).
    pub exact_us: u64,

    /// SeparableApprox 策略结果体素数.
    pub approx_count: usize,

    /// SeparableApprox 策略耗时 (微秒).
    pub approx_us: u64,
}

impl BenchRecord {
    /// 把记录写进 `w` 中.
    fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        const S4: &str = "    ";

        writeln!(w, "Phantom `{}` @ margin {:+.1} mm:", self.phantom, self.margin_mm)?;
        writeln!(w, "{S4}Base voxels: {}", self.base_count)?;
        writeln!(
            w,
            "{S4}Exact: {} voxels in {} us",
            self.exact_count, self.exact_us
        )?;
        writeln!(
            w,
            "{S4}SeparableApprox: {} voxels in {} us",
            self.approx_count, self.approx_us
        )?;
        writeln!(
            w,
            "{S4}Approx/Exact volume ratio: {:.4}",
            self.approx_count as f64 / self.exact_count as f64
        )?;
        Ok(())
    }

    /// 盒形核与球形核的包含关系: 膨胀时近似结果不小于精确结果,
    /// 腐蚀时不大于. 违反包含关系说明实现有缺陷.
    fn containment_holds(&self) -> bool {
        if self.margin_mm > 0.0 {
            self.approx_count >= self.exact_count
        } else {
            self.approx_count <= self.exact_count
        }
    }
}

/// 消融实验最终结果.
pub struct BenchResult {
    data: Vec<BenchRecord>,
}

impl BenchResult {
    pub fn from_records(data: Vec<BenchRecord>) -> Self {
        Self { data }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        let mut out = io::stdout().lock();
        writeln!(out, "{SEP}").unwrap();
        writeln!(out, "Machine parallel cores: {}", cpus()).unwrap();
        writeln!(out, "{SEP}").unwrap();

        for record in &self.data {
            record.describe_into(&mut out).unwrap();
            if !record.containment_holds() {
                writeln!(out, "    WARNING: containment violated!").unwrap();
            }
            writeln!(out, "{SEP}").unwrap();
        }
    }
}

/// 获得可并行核心数.
fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}
