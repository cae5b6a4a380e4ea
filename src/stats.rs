//! Operation counters and reporting.
//!
//! Tracks the process-visible operation counts of one engine instance:
//! elementary cell writes, elementary cell reads, MVM calls, and the
//! read-disturb mitigation activity. Counters reset only on a full
//! configuration load and survive both hot and structural updates.

use crate::config::MappingMode;

/// Monotonic operation counters for one engine instance.
#[derive(Debug, Clone, Default)]
pub struct OpCounters {
    /// Elementary polarity writes performed by mapping passes.
    pub writes: u64,
    /// Elementary cell reads performed by MVM calls.
    pub reads: u64,
    /// MVM calls executed.
    pub mvms: u64,
    /// MVM calls in which at least one cell was refreshed.
    pub refresh_passes: u64,
    /// Cell polarities rewritten by the mitigation policy.
    pub refreshed_cells: u64,
}

impl OpCounters {
    /// Clears every counter.
    pub fn reset(&mut self) {
        *self = OpCounters::default();
    }

    /// Prints a formatted summary of the operation counts.
    ///
    /// Includes the per-mode cost model: array writes per mapping call,
    /// total and sequential array reads per MVM, and the number of
    /// physical cells holding one logical value.
    pub fn print(&self, mode: MappingMode, i_bit: u32, slices: usize) {
        let i_bit = u64::from(i_bit);
        let slices = slices as u64;

        // Per-call cost of the mode, in array operations.
        let (writes_per_cpy, reads_total, reads_sequential, cells_per_value) = match mode {
            MappingMode::IDiffWDiff1Xb => (1, i_bit, 2 * i_bit, 2 * slices),
            MappingMode::IDiffWDiff2Xb => (2, 2 * i_bit, i_bit, 4 * slices),
            MappingMode::IOffsWDiff => (1, i_bit, i_bit, 2 * slices),
            MappingMode::ITcWDiff => (1, i_bit, i_bit, 2 * slices),
            MappingMode::IUintWDiff => (1, i_bit, i_bit, 2 * slices),
            MappingMode::IUintWOffs => (1, i_bit, i_bit, slices),
            MappingMode::BnnIII | MappingMode::BnnIV => (1, 2, 2, 1),
            _ => (1, 1, 1, 2),
        };

        println!("\n==========================================================");
        println!("CROSSBAR SIMULATION STATISTICS");
        println!("==========================================================");
        println!("mapping_mode             {}", mode.as_str());
        println!("op.writes                {}", self.writes);
        println!("op.reads                 {}", self.reads);
        println!("op.mvms                  {}", self.mvms);
        println!("op.refresh_passes        {}", self.refresh_passes);
        println!("op.refreshed_cells       {}", self.refreshed_cells);
        println!("----------------------------------------------------------");
        println!("MODE COST MODEL");
        println!("  writes_per_cpy         {}", writes_per_cpy);
        println!("  array_reads_per_mvm    {}", reads_total);
        println!("  sequential_reads       {}", reads_sequential);
        println!("  cells_per_value        {}", cells_per_value);
        println!("==========================================================");
    }
}
