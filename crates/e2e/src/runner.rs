//! Case execution and corpus scheduling
//!
//! A case moves Idle -> Submitting -> Observing -> Classified, or to Errored
//! from any step. Every case yields exactly one [`ResultRecord`], whichever
//! terminal state it reaches: faults (missing input field, driver errors,
//! the per-case timeout) become records through the classifier's fault policy.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use translit_common::{
    Classification, Classifier, Corpus, Evidence, Intent, ResultLog, ResultRecord, TestCase,
    UpdateTrace, Verdict,
};

use crate::config::{RunnerConfig, SelectorSet, SettleMode};
use crate::driver::{Element, PageDriver, SessionFactory};
use crate::error::{E2eError, E2eResult};
use crate::extractor::{Extraction, OutputExtractor};
use crate::locator::locate;

/// Lifecycle of one case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Idle,
    Submitting,
    Observing,
    Classified,
    Errored,
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaseState::Idle => "idle",
            CaseState::Submitting => "submitting",
            CaseState::Observing => "observing",
            CaseState::Classified => "classified",
            CaseState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Output text and verdict of a case that ran to completion
struct Observed {
    output: String,
    classification: Classification,
}

/// Drives single cases against a page
#[derive(Debug, Clone)]
pub struct CaseRunner {
    config: Arc<RunnerConfig>,
    classifier: Arc<Classifier>,
}

impl CaseRunner {
    pub fn new(config: RunnerConfig, classifier: Classifier) -> Self {
        Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Run one case to a terminal state and build its record.
    ///
    /// The recorded time runs from before navigation to classification, so
    /// it includes page load on top of submit and settle.
    pub async fn run_case<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        case: &TestCase,
    ) -> ResultRecord {
        self.run_case_within(driver, case, self.config.case_timeout()).await
    }

    /// Like [`CaseRunner::run_case`], bounded by what is left of the case budget
    async fn run_case_within<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        case: &TestCase,
        budget: Duration,
    ) -> ResultRecord {
        let start = Instant::now();
        let mut state = CaseState::Idle;
        debug!("Running {} ({})", case.id, case.intent);

        let outcome = tokio::time::timeout(budget, self.drive(driver, case, &mut state))
            .await
            .unwrap_or(Err(E2eError::Timeout(self.config.case_timeout_ms)));

        let elapsed = start.elapsed();
        let record = match outcome {
            Ok(observed) => {
                ResultRecord::completed(case, &observed.output, observed.classification, elapsed)
            }
            Err(e) => {
                warn!("{} faulted while {}: {}", case.id, state, e);
                state = CaseState::Errored;
                self.fault_record(case, &e, elapsed)
            }
        };

        debug!("{} reached {}", case.id, state);
        log_verdict(&record);
        record
    }

    fn fault_record(&self, case: &TestCase, error: &E2eError, elapsed: Duration) -> ResultRecord {
        ResultRecord::errored(case, self.classifier.fault(case.intent, &error.to_string()), elapsed)
    }

    async fn drive<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        case: &TestCase,
        state: &mut CaseState,
    ) -> E2eResult<Observed> {
        driver.navigate(&self.config.base_url).await?;
        driver.wait_for_idle().await?;

        let observed = match case.intent {
            Intent::Positive | Intent::Negative => {
                self.drive_functional(driver, case, state).await?
            }
            Intent::UiRealtime => self.drive_realtime(driver, case, state).await?,
        };

        *state = CaseState::Classified;
        Ok(observed)
    }

    async fn drive_functional<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        case: &TestCase,
        state: &mut CaseState,
    ) -> E2eResult<Observed> {
        let selectors = self.config.selectors_for(case.intent);

        *state = CaseState::Submitting;
        let input = acquire_input(driver, selectors).await?;
        driver.clear(&input).await?;
        driver.fill(&input, &case.input).await?;

        *state = CaseState::Observing;
        let extractor = self.extractor(selectors);
        let extraction = self.settle(driver, &extractor, case.intent).await?;
        debug!("{} extracted {:?} via {:?}", case.id, extraction.text, extraction.source);

        let output = extraction.as_str().to_string();
        let classification = self
            .classifier
            .classify(case, &Evidence::Output(output.clone()));
        Ok(Observed {
            output,
            classification,
        })
    }

    /// Type the input one character prefix at a time, reading output after each
    async fn drive_realtime<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        case: &TestCase,
        state: &mut CaseState,
    ) -> E2eResult<Observed> {
        let settle = &self.config.settle;
        let selectors = self.config.selectors_for(case.intent);

        *state = CaseState::Submitting;
        let input = acquire_input(driver, selectors).await?;
        driver.clear(&input).await?;
        driver.wait(Duration::from_millis(settle.realtime_clear_ms)).await?;

        *state = CaseState::Observing;
        let extractor = self.extractor(selectors);
        let chars: Vec<char> = case.input.chars().collect();
        let mut trace = UpdateTrace::default();

        for end in 1..=chars.len() {
            let prefix: String = chars[..end].iter().collect();
            driver.fill(&input, &prefix).await?;
            driver.wait(Duration::from_millis(settle.realtime_step_ms)).await?;
            let reading = extractor.extract(driver).await?;
            trace.readings.push(reading.as_str().to_string());
        }

        driver.wait(Duration::from_millis(settle.realtime_final_ms)).await?;
        trace.final_output = extractor.extract(driver).await?.as_str().to_string();
        debug!("{} observed {} update(s)", case.id, trace.distinct_changes());

        let output = trace.final_output.clone();
        let classification = self.classifier.classify(case, &Evidence::Updates(trace));
        Ok(Observed {
            output,
            classification,
        })
    }

    fn extractor<'a>(&'a self, selectors: &'a SelectorSet) -> OutputExtractor<'a> {
        OutputExtractor {
            selectors: &selectors.output,
            whole_page_fallback: selectors.whole_page_fallback,
            script: self.classifier.script(),
        }
    }

    /// Wait for rendering to finish, then extract
    async fn settle<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        extractor: &OutputExtractor<'_>,
        intent: Intent,
    ) -> E2eResult<Extraction> {
        let settle = &self.config.settle;
        match settle.mode {
            SettleMode::Fixed => {
                driver.wait(settle.after_submit(intent)).await?;
                extractor.extract(driver).await
            }
            SettleMode::Poll => {
                let interval = Duration::from_millis(settle.poll_interval_ms);
                let deadline = Instant::now() + Duration::from_millis(settle.poll_timeout_ms);

                driver.wait(interval).await?;
                let mut previous = extractor.extract(driver).await?;
                while Instant::now() < deadline {
                    driver.wait(interval).await?;
                    let current = extractor.extract(driver).await?;
                    if current == previous {
                        return Ok(current);
                    }
                    previous = current;
                }
                debug!("Output still changing after {} ms", settle.poll_timeout_ms);
                Ok(previous)
            }
        }
    }
}

async fn acquire_input<D: PageDriver + ?Sized>(
    driver: &D,
    selectors: &SelectorSet,
) -> E2eResult<Element> {
    locate(driver, &selectors.input)
        .await?
        .ok_or_else(|| E2eError::DiscoveryFailure("Input field not found".to_string()))
}

fn log_verdict(record: &ResultRecord) {
    match record.verdict {
        Verdict::Pass => info!("✓ {} ({} ms)", record.id, record.execution_ms),
        Verdict::Partial => info!("~ {} - {}", record.id, record.comment),
        Verdict::Fail => info!("✗ {} - {}", record.id, record.comment),
        Verdict::Error => warn!("! {} - {}", record.id, record.comment),
    }
}

/// Runs a whole corpus, one fresh session per case
pub struct Harness<F: SessionFactory> {
    factory: Arc<F>,
    runner: CaseRunner,
}

impl<F: SessionFactory + 'static> Harness<F> {
    pub fn new(factory: F, runner: CaseRunner) -> Self {
        Self {
            factory: Arc::new(factory),
            runner,
        }
    }

    pub fn runner(&self) -> &CaseRunner {
        &self.runner
    }

    /// Execute every case, appending one record per case to `log`.
    ///
    /// Returns once all cases reached a terminal state. Records arrive in
    /// completion order; with concurrency 1 that is corpus order.
    pub async fn run(&self, corpus: &Corpus, log: &Arc<ResultLog>) {
        let permits = Arc::new(Semaphore::new(self.runner.config().concurrency.max(1)));
        info!(
            "Running {} case(s) against {} ({} at a time)",
            corpus.len(),
            self.runner.config().base_url,
            self.runner.config().concurrency
        );

        let mut tasks = Vec::with_capacity(corpus.len());
        for case in corpus.cases() {
            let permits = Arc::clone(&permits);
            let factory = Arc::clone(&self.factory);
            let runner = self.runner.clone();
            let log = Arc::clone(log);
            let task_case = case.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                run_in_session(factory.as_ref(), &runner, &task_case, &log).await;
            });
            tasks.push((case.clone(), handle));
        }

        for (case, handle) in tasks {
            if let Err(e) = handle.await {
                error!("Task for {} aborted: {}", case.id, e);
                let classification = self.runner.classifier().fault(case.intent, &e.to_string());
                log.append(ResultRecord::errored(&case, classification, Duration::ZERO));
            }
        }
    }
}

/// Open a session, run the case and close the session again.
///
/// Opening counts against the case timeout. The record is appended before
/// the session is closed, and closing is bounded separately, so a session
/// that never opens or never closes still yields exactly one record.
async fn run_in_session<F: SessionFactory>(
    factory: &F,
    runner: &CaseRunner,
    case: &TestCase,
    log: &ResultLog,
) {
    let config = runner.config();
    let start = Instant::now();
    let budget = config.case_timeout();

    let opened = tokio::time::timeout(budget, factory.open())
        .await
        .unwrap_or(Err(E2eError::Timeout(config.case_timeout_ms)));
    let driver = match opened {
        Ok(driver) => driver,
        Err(e) => {
            warn!("Could not open a session for {}: {}", case.id, e);
            log.append(runner.fault_record(case, &e, start.elapsed()));
            return;
        }
    };

    let remaining = budget.saturating_sub(start.elapsed());
    let record = runner.run_case_within(&driver, case, remaining).await;
    log.append(record);

    match tokio::time::timeout(config.session_close_timeout(), driver.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Closing session for {} failed: {}", case.id, e),
        Err(_) => warn!(
            "Session for {} did not close within {} ms, dropping it",
            case.id, config.session_close_timeout_ms
        ),
    }
}
