use crate::test::TestSummary;
use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};

pub(crate) fn create_junit_xml(summaries: &[TestSummary]) {
    let mut test_cases = Vec::new();

    for s in summaries {
        let tc = match s.passed {
            true => TestCaseBuilder::success(&s.name, Duration::seconds_f64(s.time_secs)),
            false => TestCaseBuilder::failure(
                &s.name,
                Duration::seconds_f64(s.time_secs),
                "failure",
                &s.message,
            ),
        }
        .build();
        test_cases.push(tc);
    }

    let suite_name = crate::CRATE_NAME
        .get()
        .map(String::as_str)
        .unwrap_or("tiletb");
    let test_suite = TestSuiteBuilder::new(suite_name)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create("results.xml").unwrap();
    report.write_xml(file).unwrap();
}
