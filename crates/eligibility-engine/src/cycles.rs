//! Built-in promotion-cycle rule data.
//!
//! The per-grade reference data (cycle closeout dates, time-in-grade and
//! time-in-service minimums, high-year-tenure limits, disqualifying
//! reenlistment codes, skill-level requirements) is expressed here as
//! plain rule-table conditions, so a deployment can replace it wholesale
//! with its own JSON definition without touching code.

use crate::error::EngineError;
use crate::rules::RuleTable;
use chrono::Months;
use shared_types::{CanonicalDate, Condition, FieldValue, Outcome, ReasonCode, Rule};

/// Record fields the built-in rules read.
pub mod fields {
    pub const DATE_OF_RANK: &str = "date_of_rank";
    pub const TAFMSD: &str = "tafmsd";
    pub const RE_STATUS: &str = "re_status";
    pub const UIF: &str = "uif";
    pub const SKILL_LEVEL: &str = "pafsc_skill_level";
}

/// Reenlistment status codes that bar board consideration.
const DISQUALIFYING_RE_CODES: &[&str] = &[
    "2A", "2B", "2C", "2F", "2G", "2H", "2J", "2K", "2M", "2P", "2W", "2X", "4H", "4I", "4L",
    "4M", "4N",
];

/// Window during which the extended high-year-tenure limits apply.
const HYT_EXEMPTION_START: (i32, u32, u32) = (2023, 12, 8);
const HYT_EXEMPTION_END: (i32, u32, u32) = (2026, 9, 30);

/// Static reference data for one promotion board.
struct CycleSpec {
    /// Board / cycle identifier (the grade promoted into).
    board: &'static str,
    /// Cycle closeout date, (month, day) of the cycle year.
    scod: (u32, u32),
    /// Anchor date for the time-in-grade requirement, (month, day).
    tig_anchor: (u32, u32),
    /// Months in grade required by the anchor date.
    tig_months: u32,
    /// Years of total service required by the closeout date.
    tis_years: u32,
    /// Standard high-year-tenure limit, years of total service.
    hyt_years: u32,
    /// Extended limit applied inside the exemption window.
    hyt_exception_years: u32,
    /// Skill-level digits that satisfy the board requirement.
    skill_levels: &'static [&'static str],
}

const CYCLE_SPECS: &[CycleSpec] = &[
    CycleSpec {
        board: "E5",
        scod: (3, 31),
        tig_anchor: (2, 1),
        tig_months: 6,
        tis_years: 3,
        hyt_years: 10,
        hyt_exception_years: 12,
        skill_levels: &["5", "7", "9"],
    },
    CycleSpec {
        board: "E6",
        scod: (1, 31),
        tig_anchor: (8, 1),
        tig_months: 23,
        tis_years: 5,
        hyt_years: 20,
        hyt_exception_years: 22,
        skill_levels: &["7", "9"],
    },
    CycleSpec {
        board: "E7",
        scod: (11, 30),
        tig_anchor: (7, 1),
        tig_months: 24,
        tis_years: 8,
        hyt_years: 22,
        hyt_exception_years: 24,
        skill_levels: &["7", "9"],
    },
    CycleSpec {
        board: "E8",
        scod: (9, 30),
        tig_anchor: (7, 1),
        tig_months: 20,
        tis_years: 11,
        hyt_years: 24,
        hyt_exception_years: 26,
        skill_levels: &["7", "9"],
    },
    CycleSpec {
        board: "E9",
        scod: (7, 31),
        tig_anchor: (3, 1),
        tig_months: 21,
        tis_years: 14,
        hyt_years: 26,
        hyt_exception_years: 28,
        skill_levels: &["9"],
    },
];

fn ymd(year: i32, month: u32, day: u32) -> Result<CanonicalDate, EngineError> {
    CanonicalDate::from_ymd(year, month, day)
        .ok_or_else(|| EngineError::InvalidConfig(format!("invalid date {year}-{month}-{day}")))
}

fn minus_months(date: CanonicalDate, months: u32) -> Result<CanonicalDate, EngineError> {
    date.as_naive()
        .checked_sub_months(Months::new(months))
        .map(CanonicalDate::new)
        .ok_or_else(|| EngineError::InvalidConfig(format!("date underflow: {date} - {months}mo")))
}

fn minus_years(date: CanonicalDate, years: u32) -> Result<CanonicalDate, EngineError> {
    minus_months(date, years * 12)
}

fn day_before(date: CanonicalDate) -> Result<CanonicalDate, EngineError> {
    date.as_naive()
        .pred_opt()
        .map(CanonicalDate::new)
        .ok_or_else(|| EngineError::InvalidConfig(format!("date underflow: {date} - 1d")))
}

fn day_after(date: CanonicalDate) -> Result<CanonicalDate, EngineError> {
    date.as_naive()
        .succ_opt()
        .map(CanonicalDate::new)
        .ok_or_else(|| EngineError::InvalidConfig(format!("date overflow: {date} + 1d")))
}

/// Build the rule table for one cycle year covering boards E5 through E9.
pub fn builtin_table(year: i32) -> Result<RuleTable, EngineError> {
    let win_start = ymd(HYT_EXEMPTION_START.0, HYT_EXEMPTION_START.1, HYT_EXEMPTION_START.2)?;
    let win_end = ymd(HYT_EXEMPTION_END.0, HYT_EXEMPTION_END.1, HYT_EXEMPTION_END.2)?;

    let mut rules = Vec::new();
    for spec in CYCLE_SPECS {
        rules.extend(cycle_rules(spec, year, win_start, win_end)?);
    }
    Ok(RuleTable::from_rules(format!("builtin-{year}"), rules))
}

fn cycle_rules(
    spec: &CycleSpec,
    year: i32,
    hyt_window_start: CanonicalDate,
    hyt_window_end: CanonicalDate,
) -> Result<Vec<Rule>, EngineError> {
    let board = spec.board;
    let scod = ymd(year, spec.scod.0, spec.scod.1)?;
    let tig_anchor = ymd(year, spec.tig_anchor.0, spec.tig_anchor.1)?;

    let latest_dor = minus_months(tig_anchor, spec.tig_months)?;
    let latest_tafmsd = minus_years(scod, spec.tis_years)?;
    let hyt_cutoff = minus_years(scod, spec.hyt_years)?;
    let hyt_extended_cutoff = minus_years(scod, spec.hyt_exception_years)?;
    // Service start early enough that the standard tenure date falls
    // before the exemption window opens: the exemption cannot save them.
    let pre_window_tafmsd = day_before(minus_years(hyt_window_start, spec.hyt_years)?)?;

    let mk = |suffix: &str, priority: u32, conditions: Vec<Condition>, outcome: Outcome| Rule {
        rule_id: format!("{}-{}", board.to_lowercase(), suffix),
        cycle_id: board.to_string(),
        priority,
        conditions,
        outcome,
    };
    let ineligible = |reason_code| Outcome {
        eligible: false,
        reason_code,
    };

    // Cycles that close after the exemption window has ended revert to
    // the standard tenure limit for everyone.
    let hyt_rules = if scod > hyt_window_end {
        vec![mk(
            "hyt",
            50,
            vec![Condition::DateOnOrBefore {
                field: fields::TAFMSD.to_string(),
                date: hyt_cutoff,
            }],
            ineligible(ReasonCode::HighYearTenure),
        )]
    } else {
        vec![
            mk(
                "hyt-extended",
                50,
                vec![Condition::DateOnOrBefore {
                    field: fields::TAFMSD.to_string(),
                    date: hyt_extended_cutoff,
                }],
                ineligible(ReasonCode::HighYearTenure),
            ),
            mk(
                "hyt",
                51,
                vec![
                    Condition::DateOnOrBefore {
                        field: fields::TAFMSD.to_string(),
                        date: hyt_cutoff,
                    },
                    Condition::DateOnOrBefore {
                        field: fields::TAFMSD.to_string(),
                        date: pre_window_tafmsd,
                    },
                ],
                ineligible(ReasonCode::HighYearTenure),
            ),
        ]
    };

    let mut rules = vec![
        mk(
            "re-code",
            10,
            vec![Condition::OneOf {
                field: fields::RE_STATUS.to_string(),
                values: DISQUALIFYING_RE_CODES.iter().map(|c| c.to_string()).collect(),
            }],
            ineligible(ReasonCode::ReenlistmentCode),
        ),
        mk(
            "uif",
            20,
            vec![Condition::Equals {
                field: fields::UIF.to_string(),
                value: FieldValue::flag(true),
            }],
            ineligible(ReasonCode::UnfavorableInformationFile),
        ),
        mk(
            "tig",
            30,
            vec![Condition::DateOnOrAfter {
                field: fields::DATE_OF_RANK.to_string(),
                date: day_after(latest_dor)?,
            }],
            ineligible(ReasonCode::TimeInGrade),
        ),
        mk(
            "tis",
            40,
            vec![Condition::DateOnOrAfter {
                field: fields::TAFMSD.to_string(),
                date: day_after(latest_tafmsd)?,
            }],
            ineligible(ReasonCode::TimeInService),
        ),
        mk(
            "skill-level",
            60,
            vec![Condition::NoneOf {
                field: fields::SKILL_LEVEL.to_string(),
                values: spec.skill_levels.iter().map(|s| s.to_string()).collect(),
            }],
            ineligible(ReasonCode::SkillLevel),
        ),
        mk(
            "qualified",
            100,
            vec![],
            Outcome {
                eligible: true,
                reason_code: ReasonCode::FullyQualified,
            },
        ),
    ];
    rules.extend(hyt_rules);
    Ok(rules)
}
