//! Tests for `Period::find_first`: the first occurrence strictly after an
//! arbitrary instant.

use period_engine::{DateTime, Fields, Period, PeriodDst, PeriodError, TimeUnit, Zone};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn amsterdam() -> Option<Zone> {
    Some(Zone::named("Europe/Amsterdam", true).unwrap())
}

fn utc() -> Option<Zone> {
    Some(Zone::utc())
}

fn at(zone: Option<Zone>, y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime {
    DateTime::new(Fields::date(y, m, d).with_time(h, mi, 0, 0), zone).unwrap()
}

fn at_s(zone: Option<Zone>, y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime {
    DateTime::new(Fields::date(y, m, d).with_time(h, mi, s, 0), zone).unwrap()
}

fn period(start: DateTime, amount: i64, unit: TimeUnit) -> Period {
    Period::from_amount(start, amount, unit, None).unwrap()
}

// ---------------------------------------------------------------------------
// Basics
// ---------------------------------------------------------------------------

#[test]
fn hourly_utc_rounds_up_to_next_hour() {
    let p = period(at(utc(), 2014, 1, 1, 0, 0), 1, TimeUnit::Hour);
    let result = p.find_first(&at(utc(), 2014, 1, 1, 0, 30)).unwrap();
    assert_eq!(result, at(utc(), 2014, 1, 1, 1, 0));
}

#[test]
fn boundary_input_gives_the_following_occurrence() {
    let p = period(at(utc(), 2014, 1, 1, 0, 0), 1, TimeUnit::Hour);
    let result = p.find_first(&at(utc(), 2014, 1, 1, 1, 0)).unwrap();
    assert_eq!(result, at(utc(), 2014, 1, 1, 2, 0), "must be strictly after");
}

#[test]
fn input_before_start_gives_start() {
    let start = at(utc(), 2014, 1, 1, 0, 0);
    let p = period(start, 1, TimeUnit::Hour);
    let result = p.find_first(&at(utc(), 2013, 6, 1, 17, 45)).unwrap();
    assert_eq!(result, start);
}

#[test]
fn result_is_expressed_in_the_input_zone() {
    let p = period(at(utc(), 2014, 1, 1, 0, 0), 1, TimeUnit::Hour);
    let plus_one = Some(Zone::offset_minutes(60).unwrap());
    let result = p.find_first(&at(plus_one, 2014, 1, 1, 1, 30)).unwrap();
    assert!(
        result.identical(&at(plus_one, 2014, 1, 1, 2, 0)),
        "expected 02:00+01:00, got {}",
        result
    );
}

#[test]
fn awareness_mismatch_is_rejected() {
    let p = period(at(utc(), 2014, 1, 1, 0, 0), 1, TimeUnit::Hour);
    let result = p.find_first(&at(None, 2014, 1, 1, 0, 30));
    assert!(matches!(result, Err(PeriodError::InvalidArgument(_))));

    let naive = period(at(None, 2014, 1, 1, 0, 0), 1, TimeUnit::Hour);
    let result = naive.find_first(&at(utc(), 2014, 1, 1, 0, 30));
    assert!(matches!(result, Err(PeriodError::InvalidArgument(_))));
}

// ---------------------------------------------------------------------------
// Multi-amount, regular intervals
// ---------------------------------------------------------------------------

#[test]
fn quarter_hours_utc() {
    let p = period(at(utc(), 2014, 1, 1, 0, 0), 15, TimeUnit::Minute);
    let result = p
        .find_first(&at_s(utc(), 2014, 6, 15, 13, 47, 12))
        .unwrap();
    assert_eq!(result, at(utc(), 2014, 6, 15, 14, 0));
}

#[test]
fn seven_seconds_zone_naive() {
    let p = period(at(None, 2014, 1, 1, 0, 0), 7, TimeUnit::Second);
    let result = p.find_first(&at(None, 2014, 1, 1, 0, 1)).unwrap();
    assert_eq!(result, at_s(None, 2014, 1, 1, 0, 1, 3));
    assert_eq!(result.zone(), None);
}

#[test]
fn every_two_years_from_leap_day() {
    let p = period(at(utc(), 2012, 2, 29, 0, 0), 2, TimeUnit::Year);
    let result = p.find_first(&at(utc(), 2013, 6, 1, 0, 0)).unwrap();
    assert_eq!(result, at(utc(), 2014, 2, 28, 0, 0));
}

#[test]
fn every_three_months_utc() {
    let p = period(at(utc(), 2014, 1, 15, 9, 0), 3, TimeUnit::Month);
    let result = p.find_first(&at(utc(), 2014, 8, 1, 0, 0)).unwrap();
    assert_eq!(result, at(utc(), 2014, 10, 15, 9, 0));
}

// ---------------------------------------------------------------------------
// Month ends and leap days
// ---------------------------------------------------------------------------

#[test]
fn monthly_from_month_end_returns_last_day_of_short_month() {
    let p = period(at(utc(), 2014, 1, 31, 0, 0), 1, TimeUnit::Month);
    assert_eq!(
        p.find_first(&at(utc(), 2014, 2, 10, 0, 0)).unwrap(),
        at(utc(), 2014, 2, 28, 0, 0)
    );
    assert_eq!(
        p.find_first(&at(utc(), 2014, 1, 31, 12, 0)).unwrap(),
        at(utc(), 2014, 2, 28, 0, 0)
    );
}

#[test]
fn monthly_from_month_end_restores_the_day_in_long_months() {
    let p = period(at(utc(), 2014, 1, 31, 0, 0), 1, TimeUnit::Month);
    assert_eq!(
        p.find_first(&at(utc(), 2014, 3, 30, 0, 0)).unwrap(),
        at(utc(), 2014, 3, 31, 0, 0),
        "Mar 31 is the March occurrence, not Mar 28"
    );
    assert_eq!(
        p.find_first(&at(utc(), 2014, 3, 31, 0, 0)).unwrap(),
        at(utc(), 2014, 4, 30, 0, 0)
    );
}

#[test]
fn yearly_from_leap_day() {
    let p = period(at(utc(), 2012, 2, 29, 0, 0), 1, TimeUnit::Year);
    assert_eq!(
        p.find_first(&at(utc(), 2013, 1, 1, 0, 0)).unwrap(),
        at(utc(), 2013, 2, 28, 0, 0)
    );
    assert_eq!(
        p.find_first(&at(utc(), 2015, 3, 1, 0, 0)).unwrap(),
        at(utc(), 2016, 2, 29, 0, 0),
        "leap years get the leap day back"
    );
}

#[test]
fn yearly_from_month_end_outside_february() {
    let p = period(at(utc(), 2014, 3, 31, 0, 0), 1, TimeUnit::Year);
    assert_eq!(
        p.find_first(&at(utc(), 2015, 3, 30, 0, 0)).unwrap(),
        at(utc(), 2015, 3, 31, 0, 0)
    );
}

// ---------------------------------------------------------------------------
// Months and years on the UTC calendar
// ---------------------------------------------------------------------------

fn plus_one() -> Option<Zone> {
    Some(Zone::offset_minutes(60).unwrap())
}

#[test]
fn monthly_in_offset_zone_follows_the_utc_month_end() {
    // 00:30 on the 1st at +01:00 is 23:30 UTC on the last day of the month before
    let p = period(at(plus_one(), 2014, 2, 1, 0, 30), 1, TimeUnit::Month);
    let march = p.find_first(&at(plus_one(), 2014, 2, 10, 0, 0)).unwrap();
    assert_eq!(march, at(plus_one(), 2014, 3, 1, 0, 30));
    let may = p.find_first(&at(plus_one(), 2014, 4, 10, 0, 0)).unwrap();
    assert_eq!(may, at(plus_one(), 2014, 5, 1, 0, 30));

    for occurrence in [march, may] {
        assert!(
            p.is_boundary(Some(&occurrence)).unwrap(),
            "{} should be a boundary",
            occurrence
        );
    }
    assert_eq!(
        p.find_next(&march).unwrap(),
        Some(at(plus_one(), 2014, 4, 1, 0, 30))
    );
}

#[test]
fn every_two_months_in_offset_zone() {
    let p = period(at(plus_one(), 2014, 2, 1, 0, 30), 2, TimeUnit::Month);
    assert_eq!(
        p.find_first(&at(plus_one(), 2014, 4, 10, 0, 0)).unwrap(),
        at(plus_one(), 2014, 6, 1, 0, 30)
    );
}

#[test]
fn yearly_in_offset_zone_from_utc_leap_day() {
    // 2012-03-01T00:30+01:00 is 2012-02-29T23:30Z
    let p = period(at(plus_one(), 2012, 3, 1, 0, 30), 1, TimeUnit::Year);
    let next_year = p.find_first(&at(plus_one(), 2013, 1, 10, 0, 0)).unwrap();
    assert_eq!(next_year, at(plus_one(), 2013, 3, 1, 0, 30));
    assert_eq!(next_year, at(utc(), 2013, 2, 28, 23, 30));
    assert!(p.is_boundary(Some(&next_year)).unwrap());

    assert_eq!(
        p.find_first(&at(plus_one(), 2015, 6, 1, 0, 0)).unwrap(),
        at(utc(), 2016, 2, 29, 23, 30),
        "leap years get the UTC leap day back"
    );
}

#[test]
fn monthly_regular_intervals_in_dst_zone_keep_utc_time() {
    let p = Period::from_amount(
        at(amsterdam(), 2014, 1, 1, 0, 30),
        1,
        TimeUnit::Month,
        Some(PeriodDst::RegularIntervals),
    )
    .unwrap();
    let march = p.find_first(&at(amsterdam(), 2014, 2, 10, 0, 0)).unwrap();
    assert_eq!(march, at(utc(), 2014, 2, 28, 23, 30));

    let may = p.find_first(&at(amsterdam(), 2014, 4, 10, 0, 0)).unwrap();
    assert_eq!(may, at(utc(), 2014, 4, 30, 23, 30));
    assert_eq!((may.day(), may.hour()), (1, 1), "01:30 summer time");
    assert!(p.is_boundary(Some(&may)).unwrap());
}

// ---------------------------------------------------------------------------
// Regular local time
// ---------------------------------------------------------------------------

#[test]
fn two_hours_local() {
    let p = period(at(amsterdam(), 2014, 1, 1, 0, 0), 2, TimeUnit::Hour);
    let result = p.find_first(&at(amsterdam(), 2014, 6, 15, 13, 30)).unwrap();
    assert_eq!(result, at(amsterdam(), 2014, 6, 15, 14, 0));
}

#[test]
fn five_hours_local_restarts_every_day() {
    // slots 08, 13, 18, 23 and 04 the next morning, then 08 again
    let p = period(at(amsterdam(), 2014, 1, 1, 8, 0), 5, TimeUnit::Hour);
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 2, 3, 0)).unwrap(),
        at(amsterdam(), 2014, 1, 2, 4, 0)
    );
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 2, 4, 30)).unwrap(),
        at(amsterdam(), 2014, 1, 2, 8, 0),
        "the short slot ends at the daily restart"
    );
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 2, 9, 0)).unwrap(),
        at(amsterdam(), 2014, 1, 2, 13, 0)
    );
}

#[test]
fn five_hours_local_from_midnight() {
    let p = period(at(amsterdam(), 2014, 1, 1, 0, 0), 5, TimeUnit::Hour);
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 1, 19, 0)).unwrap(),
        at(amsterdam(), 2014, 1, 1, 20, 0)
    );
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 1, 20, 0)).unwrap(),
        at(amsterdam(), 2014, 1, 2, 0, 0),
        "20:00 is the last slot of the day"
    );
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 2, 3, 0)).unwrap(),
        at(amsterdam(), 2014, 1, 2, 5, 0)
    );
}

#[test]
fn seven_seconds_local_searches_within_the_day() {
    let p = period(at(amsterdam(), 2014, 1, 1, 0, 0), 7, TimeUnit::Second);
    assert_eq!(
        p.find_first(&at(amsterdam(), 2014, 1, 1, 0, 1)).unwrap(),
        at_s(amsterdam(), 2014, 1, 1, 0, 1, 3)
    );
    // 86400 = 12342 * 7 + 6, so the last slot of the day is at 23:59:54
    assert_eq!(
        p.find_first(&at_s(amsterdam(), 2014, 1, 1, 23, 59, 55)).unwrap(),
        at(amsterdam(), 2014, 1, 2, 0, 0)
    );
}

#[test]
fn quarter_hours_local_with_offset_phase() {
    let p = period(at(amsterdam(), 2014, 1, 1, 0, 5), 15, TimeUnit::Minute);
    let result = p.find_first(&at(amsterdam(), 2014, 6, 15, 13, 47)).unwrap();
    assert_eq!(result, at(amsterdam(), 2014, 6, 15, 13, 50));
}

#[test]
fn every_ten_days_local() {
    let p = period(at(amsterdam(), 2014, 3, 25, 12, 0), 10, TimeUnit::Day);
    let result = p.find_first(&at(amsterdam(), 2014, 4, 1, 0, 0)).unwrap();
    assert_eq!(result, at(amsterdam(), 2014, 4, 4, 12, 0));
    assert_eq!(result.hour(), 12, "local time of day is kept across DST");
}

#[test]
fn every_three_months_local_from_month_end() {
    let p = period(at(amsterdam(), 2014, 11, 30, 10, 0), 3, TimeUnit::Month);
    let result = p.find_first(&at(amsterdam(), 2015, 3, 1, 0, 0)).unwrap();
    assert_eq!(result, at(amsterdam(), 2015, 5, 30, 10, 0));
}

#[test]
fn every_two_months_local_carries_into_next_year() {
    let p = period(at(amsterdam(), 2014, 11, 15, 10, 0), 2, TimeUnit::Month);
    let result = p.find_first(&at(amsterdam(), 2015, 2, 1, 0, 0)).unwrap();
    assert_eq!(result, at(amsterdam(), 2015, 3, 15, 10, 0));
}

#[test]
fn every_two_years_local() {
    let p = period(at(amsterdam(), 2010, 7, 1, 9, 0), 2, TimeUnit::Year);
    let result = p.find_first(&at(amsterdam(), 2015, 1, 1, 0, 0)).unwrap();
    assert_eq!(result, at(amsterdam(), 2016, 7, 1, 9, 0));
}

// ---------------------------------------------------------------------------
// Upcoming
// ---------------------------------------------------------------------------

#[test]
fn find_upcoming_reads_the_time_source() {
    use chrono::TimeZone;
    use period_engine::FixedTimeSource;

    let p = period(at(utc(), 2014, 1, 1, 0, 0), 1, TimeUnit::Day);
    let now = chrono::Utc.with_ymd_and_hms(2014, 5, 5, 13, 0, 0).unwrap();
    let result = p.find_upcoming(&FixedTimeSource(now)).unwrap();
    assert_eq!(result, at(utc(), 2014, 5, 6, 0, 0));
}

#[test]
fn regular_intervals_keeps_utc_distance() {
    let p = Period::from_amount(
        at(amsterdam(), 2014, 3, 1, 8, 5),
        1,
        TimeUnit::Day,
        Some(PeriodDst::RegularIntervals),
    )
    .unwrap();
    let result = p.find_first(&at(amsterdam(), 2014, 3, 29, 8, 5)).unwrap();
    assert_eq!(result, at(amsterdam(), 2014, 3, 30, 9, 5));
}
