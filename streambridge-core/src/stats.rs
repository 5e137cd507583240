//! Bridge counters

/// Work done by a single tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Connections admitted from the acceptor queue
    pub admitted: usize,
    /// Dead clients removed during cleanup
    pub evicted: usize,
    /// Bytes read from the stream and broadcast
    pub bytes_read: usize,
    /// Bytes accepted by the stream
    pub bytes_written: usize,
    /// Lines published to the sink
    pub lines: usize,
    /// Client bytes still waiting for the stream after this tick
    pub backlog: usize,
}

impl TickReport {
    /// True when the tick neither moved data nor changed the client set
    pub fn is_idle(&self) -> bool {
        self.admitted == 0
            && self.evicted == 0
            && self.bytes_read == 0
            && self.bytes_written == 0
    }
}

/// Cumulative counters since the bridge was created
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    pub ticks: u64,
    pub bytes_from_stream: u64,
    pub bytes_to_stream: u64,
    pub lines_published: u64,
    /// Bytes dropped because a line exceeded the framer capacity
    pub line_bytes_dropped: u64,
    pub clients_admitted: u64,
    pub clients_evicted: u64,
    /// Ticks whose read phase stopped on the per-tick budget
    pub read_budget_exhausted: u64,
}

impl BridgeStats {
    pub(crate) fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.bytes_from_stream += report.bytes_read as u64;
        self.bytes_to_stream += report.bytes_written as u64;
        self.lines_published += report.lines as u64;
        self.clients_admitted += report.admitted as u64;
        self.clients_evicted += report.evicted as u64;
    }
}
