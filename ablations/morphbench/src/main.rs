//! margin 形态学策略消融实验入口.

mod phantom;
mod result;
mod runner;

fn main() {
    let result = runner::run();
    result.analyze();
}
