//! Report rendering for run summaries

use crate::constants::REPORT_RULE;
use crate::errors::Result;
use crate::metrics::summary::RunSummary;

use std::fmt;

impl RunSummary {
    /// Pretty-printed JSON rendering of the summary
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", REPORT_RULE)?;
        writeln!(f, "                           STRESS TEST RESULTS")?;
        writeln!(f, "{}", REPORT_RULE)?;
        writeln!(f)?;
        writeln!(f, "Test Duration:        {:.2}s", self.duration)?;
        writeln!(f, "Total Requests:       {}", self.total_requests)?;
        writeln!(
            f,
            "Successful:           {} ({:.2}%)",
            self.successful_requests,
            self.success_rate()
        )?;
        writeln!(f, "Failed:               {}", self.failed_requests)?;

        writeln!(f)?;
        writeln!(f, "RESPONSE TIMES")?;
        writeln!(f, "--------------")?;
        writeln!(f, "Average:              {:.2}ms", self.average_response_time)?;
        writeln!(f, "Min:                  {:.2}ms", self.min_response_time)?;
        writeln!(f, "Max:                  {:.2}ms", self.max_response_time)?;
        writeln!(f, "95th Percentile:      {:.2}ms", self.percentile_95)?;
        writeln!(f, "99th Percentile:      {:.2}ms", self.percentile_99)?;

        writeln!(f)?;
        writeln!(f, "THROUGHPUT")?;
        writeln!(f, "----------")?;
        writeln!(f, "Requests/sec:         {:.2}", self.requests_per_second)?;

        writeln!(f)?;
        writeln!(f, "STATUS CODES")?;
        writeln!(f, "------------")?;
        for (status, count) in &self.status_codes {
            writeln!(f, "{:<22}{}", format!("{}:", status), count)?;
        }

        if !self.error_messages.is_empty() {
            writeln!(f)?;
            writeln!(f, "ERRORS")?;
            writeln!(f, "------")?;
            for (error, count) in &self.error_messages {
                writeln!(f, "{}: {}", error, count)?;
            }
        }

        write!(f, "{}", REPORT_RULE)
    }
}
