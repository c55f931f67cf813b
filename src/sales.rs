//! Sales-side KPIs and analytics.
//!
//! Everything here is a pure function over dashboard tables; the HTTP layer
//! only wires session tables into these and serializes the results.

use crate::table::Table;
use serde::Serialize;

/// Headline sales KPIs from the monthly table.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SalesKpis {
    pub total_revenue: f64,
    pub total_sales: f64,
    pub total_leads: f64,
    /// Percent: sales / leads * 100, 0 when there are no leads.
    pub avg_conversion: f64,
}

pub fn kpis(monthly: &Table) -> SalesKpis {
    let total_revenue = monthly.column_sum("revenue");
    let total_sales = monthly.column_sum("sales");
    let total_leads = monthly.column_sum("leads");
    let avg_conversion = if total_leads > 0.0 {
        total_sales / total_leads * 100.0
    } else {
        0.0
    };
    SalesKpis {
        total_revenue,
        total_sales,
        total_leads,
        avg_conversion,
    }
}

/// Last month against the one before it.
#[derive(Clone, Debug, Serialize)]
pub struct MonthlySummary {
    pub last_month: String,
    pub last_revenue: f64,
    pub last_sales: f64,
    pub revenue_growth: f64,
    pub sales_growth: f64,
    pub last_avg_ticket: f64,
}

pub fn monthly_summary(monthly: &Table) -> Option<MonthlySummary> {
    if monthly.is_empty() {
        return None;
    }
    let last = monthly.len() - 1;
    // A single row compares the month with itself (zero growth).
    let prev = last.saturating_sub(1);

    let cell = |row: usize, col: &str| monthly.get(row, col).and_then(|c| c.as_number());
    let last_revenue = cell(last, "revenue")?;
    let last_sales = cell(last, "sales")?;
    let prev_revenue = cell(prev, "revenue")?;
    let prev_sales = cell(prev, "sales")?;

    Some(MonthlySummary {
        last_month: monthly.get(last, "month")?.to_display(),
        last_revenue,
        last_sales,
        revenue_growth: growth_percent(prev_revenue, last_revenue),
        sales_growth: growth_percent(prev_sales, last_sales),
        last_avg_ticket: cell(last, "avg_ticket").unwrap_or(0.0),
    })
}

fn growth_percent(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MonthMetric {
    pub month: String,
    pub value: f64,
}

/// Trend pass over the monthly table: least-squares slopes, trailing moving
/// averages and the best/worst months.
#[derive(Clone, Debug, Serialize)]
pub struct MonthlyTrends {
    pub revenue_slope: f64,
    pub sales_slope: f64,
    pub conversion_slope: f64,
    pub revenue_moving_avg: Vec<f64>,
    pub sales_moving_avg: Vec<f64>,
    pub best_revenue_month: MonthMetric,
    pub worst_revenue_month: MonthMetric,
    pub best_sales_month: MonthMetric,
    pub worst_sales_month: MonthMetric,
}

pub fn monthly_trends(monthly: &Table) -> Option<MonthlyTrends> {
    if monthly.is_empty() {
        return None;
    }

    let metric = |column: &str, row: usize| -> Option<MonthMetric> {
        Some(MonthMetric {
            month: monthly.get(row, "month")?.to_display(),
            value: monthly.get(row, column)?.as_number()?,
        })
    };

    Some(MonthlyTrends {
        revenue_slope: linear_slope(&monthly.numeric_column("revenue")),
        sales_slope: linear_slope(&monthly.numeric_column("sales")),
        conversion_slope: linear_slope(&monthly.numeric_column("conversion")),
        revenue_moving_avg: moving_average(&monthly.numeric_column("revenue"), 3),
        sales_moving_avg: moving_average(&monthly.numeric_column("sales"), 3),
        best_revenue_month: metric("revenue", monthly.max_row("revenue")?)?,
        worst_revenue_month: metric("revenue", monthly.min_row("revenue")?)?,
        best_sales_month: metric("sales", monthly.max_row("sales")?)?,
        worst_sales_month: metric("sales", monthly.min_row("sales")?)?,
    })
}

/// Least-squares slope of `values` over the index 0..n.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 { 0.0 } else { num / den }
}

/// Trailing moving average with a shrinking window at the start.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    var.sqrt()
}

/// Group a label column against a numeric column, preserving first-seen
/// label order. Returns (label, sum, count).
fn group_sum(table: &Table, label_col: &str, value_col: &str) -> Vec<(String, f64, usize)> {
    let label_idx = match table.column_index(label_col) {
        Some(i) => i,
        None => return Vec::new(),
    };
    let value_idx = match table.column_index(value_col) {
        Some(i) => i,
        None => return Vec::new(),
    };

    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    for row in &table.rows {
        let label = row[label_idx].to_display();
        let value = row[value_idx].as_number().unwrap_or(0.0);
        match groups.iter_mut().find(|(l, _, _)| *l == label) {
            Some((_, sum, count)) => {
                *sum += value;
                *count += 1;
            }
            None => groups.push((label, value, 1)),
        }
    }
    groups
}

#[derive(Clone, Debug, Serialize)]
pub struct LabeledShare {
    pub label: String,
    pub value: f64,
    pub share: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupStats {
    pub label: String,
    pub sum: f64,
    pub count: usize,
    pub share: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GeoAnalysis {
    pub total_states: usize,
    pub total_sales: f64,
    pub sales_by_region: Vec<GroupStats>,
    /// Top 3 states with their share of total sales.
    pub standout_states: Vec<LabeledShare>,
    /// States selling more than 1.5x the per-state mean.
    pub high_performers: Vec<LabeledShare>,
}

pub fn geographic(states: &Table) -> Option<GeoAnalysis> {
    if states.is_empty() {
        return None;
    }
    let total = states.column_sum("sales");
    let mean = total / states.len() as f64;

    let mut shares: Vec<LabeledShare> = states
        .rows
        .iter()
        .map(|row| {
            let label = row[states.column_index("state")?].to_display();
            let value = row[states.column_index("sales")?].as_number().unwrap_or(0.0);
            Some(LabeledShare {
                label,
                value,
                share: if total > 0.0 { value / total * 100.0 } else { 0.0 },
            })
        })
        .collect::<Option<Vec<_>>>()?;
    shares.sort_by(|a, b| b.value.total_cmp(&a.value));

    let sales_by_region = group_sum(states, "region", "sales")
        .into_iter()
        .map(|(label, sum, count)| GroupStats {
            label,
            sum,
            count,
            share: if total > 0.0 { sum / total * 100.0 } else { 0.0 },
        })
        .collect();

    let high_performers = shares
        .iter()
        .filter(|s| mean > 0.0 && s.value / mean > 1.5)
        .cloned()
        .collect();

    Some(GeoAnalysis {
        total_states: states.len(),
        total_sales: total,
        sales_by_region,
        standout_states: shares.iter().take(3).cloned().collect(),
        high_performers,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct Concentration {
    pub top3_share: f64,
    pub top5_share: f64,
    /// Sum of squared market shares normalized to 0..=1.
    pub herfindahl_index: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BrandAnalysis {
    pub total_brands: usize,
    /// Every brand with market share, sorted descending.
    pub market_share: Vec<LabeledShare>,
    /// Running share total, aligned with `market_share`.
    pub cumulative_share: Vec<f64>,
    pub sales_by_category: Vec<GroupStats>,
    pub concentration: Concentration,
    /// Brands under 10% market share.
    pub growth_candidates: Vec<LabeledShare>,
}

pub fn brand_performance(brands: &Table) -> Option<BrandAnalysis> {
    if brands.is_empty() {
        return None;
    }
    let total = brands.column_sum("sales");

    let mut market_share: Vec<LabeledShare> = brands
        .rows
        .iter()
        .map(|row| {
            let label = row[brands.column_index("brand")?].to_display();
            let value = row[brands.column_index("sales")?].as_number().unwrap_or(0.0);
            Some(LabeledShare {
                label,
                value,
                share: if total > 0.0 { value / total * 100.0 } else { 0.0 },
            })
        })
        .collect::<Option<Vec<_>>>()?;
    market_share.sort_by(|a, b| b.share.total_cmp(&a.share));

    let cumulative_share: Vec<f64> = market_share
        .iter()
        .scan(0.0, |acc, s| {
            *acc += s.share;
            Some(*acc)
        })
        .collect();

    let sales_by_category = group_sum(brands, "category", "sales")
        .into_iter()
        .map(|(label, sum, count)| GroupStats {
            label,
            sum,
            count,
            share: if total > 0.0 { sum / total * 100.0 } else { 0.0 },
        })
        .collect();

    let top3_share: f64 = market_share.iter().take(3).map(|s| s.share).sum();
    let top5_share: f64 = market_share.iter().take(5).map(|s| s.share).sum();
    let herfindahl_index = market_share.iter().map(|s| s.share * s.share).sum::<f64>() / 10_000.0;

    let growth_candidates = market_share
        .iter()
        .filter(|s| s.share < 10.0)
        .cloned()
        .collect();

    Some(BrandAnalysis {
        total_brands: brands.len(),
        market_share,
        cumulative_share,
        sales_by_category,
        concentration: Concentration {
            top3_share,
            top5_share,
            herfindahl_index,
        },
        growth_candidates,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct StorePerformanceMetrics {
    pub mean_sales: f64,
    pub std_dev: f64,
    /// Percent; 0 when the mean is 0.
    pub coefficient_of_variation: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StoreEntry {
    pub store: String,
    pub sales: f64,
    pub city: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct StoreAnalysis {
    pub total_stores: usize,
    pub sales_by_state: Vec<GroupStats>,
    pub sales_by_city: Vec<GroupStats>,
    pub metrics: StorePerformanceMetrics,
    /// Above mean + one standard deviation.
    pub high_performers: Vec<StoreEntry>,
    /// Below mean - one standard deviation.
    pub low_performers: Vec<StoreEntry>,
}

pub fn store_performance(stores: &Table) -> Option<StoreAnalysis> {
    if stores.is_empty() {
        return None;
    }
    let sales = stores.numeric_column("sales");
    let total: f64 = sales.iter().sum();
    let mean = total / sales.len().max(1) as f64;
    let sd = std_dev(&sales);

    let stats = |col: &str| -> Vec<GroupStats> {
        group_sum(stores, col, "sales")
            .into_iter()
            .map(|(label, sum, count)| GroupStats {
                label,
                sum,
                count,
                share: if total > 0.0 { sum / total * 100.0 } else { 0.0 },
            })
            .collect()
    };

    let entries = |predicate: &dyn Fn(f64) -> bool| -> Vec<StoreEntry> {
        stores
            .rows
            .iter()
            .filter_map(|row| {
                let value = row[stores.column_index("sales")?].as_number()?;
                if predicate(value) {
                    Some(StoreEntry {
                        store: row[stores.column_index("store")?].to_display(),
                        sales: value,
                        city: row[stores.column_index("city")?].to_display(),
                    })
                } else {
                    None
                }
            })
            .collect()
    };

    Some(StoreAnalysis {
        total_stores: stores.len(),
        sales_by_state: stats("state"),
        sales_by_city: stats("city"),
        metrics: StorePerformanceMetrics {
            mean_sales: mean,
            std_dev: sd,
            coefficient_of_variation: if mean > 0.0 { sd / mean * 100.0 } else { 0.0 },
        },
        high_performers: entries(&|v| v > mean + sd),
        low_performers: entries(&|v| v < mean - sd),
    })
}

const WEEKDAYS: &[&str] = &["monday", "tuesday", "wednesday", "thursday", "friday"];
const WEEKEND: &[&str] = &["saturday", "sunday"];

#[derive(Clone, Debug, Serialize)]
pub struct DayShare {
    pub weekday: String,
    pub visits: f64,
    pub share: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WeekSplit {
    pub weekday_visits: f64,
    pub weekend_visits: f64,
    pub weekday_share: f64,
    pub weekend_share: f64,
    /// Visits per weekday / per weekend day.
    pub weekday_efficiency: f64,
    pub weekend_efficiency: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct VisitsAnalysis {
    pub total_visits: f64,
    /// Ordered by the `rank` column.
    pub daily_distribution: Vec<DayShare>,
    pub week_split: WeekSplit,
    pub recommendations: Vec<String>,
}

pub fn visits_patterns(visits: &Table) -> Option<VisitsAnalysis> {
    if visits.is_empty() {
        return None;
    }
    let total = visits.column_sum("visits");

    let mut days: Vec<(f64, DayShare)> = visits
        .rows
        .iter()
        .map(|row| {
            let weekday = row[visits.column_index("weekday")?].to_display();
            let count = row[visits.column_index("visits")?].as_number().unwrap_or(0.0);
            let rank = row[visits.column_index("rank")?].as_number().unwrap_or(0.0);
            Some((
                rank,
                DayShare {
                    weekday,
                    visits: count,
                    share: if total > 0.0 { count / total * 100.0 } else { 0.0 },
                },
            ))
        })
        .collect::<Option<Vec<_>>>()?;
    days.sort_by(|a, b| a.0.total_cmp(&b.0));
    let daily: Vec<DayShare> = days.into_iter().map(|(_, d)| d).collect();

    let sum_of = |names: &[&str]| -> f64 {
        daily
            .iter()
            .filter(|d| names.contains(&d.weekday.as_str()))
            .map(|d| d.visits)
            .sum()
    };
    let weekday_visits = sum_of(WEEKDAYS);
    let weekend_visits = sum_of(WEEKEND);

    let week_split = WeekSplit {
        weekday_visits,
        weekend_visits,
        weekday_share: if total > 0.0 { weekday_visits / total * 100.0 } else { 0.0 },
        weekend_share: if total > 0.0 { weekend_visits / total * 100.0 } else { 0.0 },
        weekday_efficiency: weekday_visits / WEEKDAYS.len() as f64,
        weekend_efficiency: weekend_visits / WEEKEND.len() as f64,
    };

    let recommendations = visit_recommendations(&daily, weekend_visits, total);

    Some(VisitsAnalysis {
        total_visits: total,
        daily_distribution: daily,
        week_split,
        recommendations,
    })
}

fn visit_recommendations(daily: &[DayShare], weekend_visits: f64, total: f64) -> Vec<String> {
    let mut recommendations = Vec::new();
    if daily.is_empty() || total <= 0.0 {
        return recommendations;
    }

    let peak = daily
        .iter()
        .max_by(|a, b| a.visits.total_cmp(&b.visits))
        .unwrap();
    let trough = daily
        .iter()
        .min_by(|a, b| a.visits.total_cmp(&b.visits))
        .unwrap();
    if trough.visits > 0.0 && peak.visits / trough.visits > 3.0 {
        recommendations.push(format!(
            "consider shifting resources from {} to {}",
            peak.weekday, trough.weekday
        ));
    }

    if weekend_visits < total * 0.2 {
        recommendations.push("run dedicated weekend campaigns".to_string());
    }

    let mean = total / daily.len() as f64;
    let slow_days: Vec<&str> = daily
        .iter()
        .filter(|d| d.visits < mean * 0.7)
        .map(|d| d.weekday.as_str())
        .collect();
    if !slow_days.is_empty() {
        recommendations.push(format!(
            "optimize operations on slow days: {}",
            slow_days.join(", ")
        ));
    }

    recommendations
}

/// Marketing-return metrics over the monthly table.
#[derive(Clone, Debug, Serialize)]
pub struct RoiMetrics {
    pub roi: f64,
    /// Customer acquisition cost.
    pub cac: f64,
    /// Lifetime value proxy: revenue per sale.
    pub ltv: f64,
    pub ltv_cac_ratio: f64,
    pub marketing_investment: f64,
    pub total_revenue: f64,
}

/// When no investment figure is given, estimate it as 15% of revenue.
pub fn roi_metrics(monthly: &Table, marketing_investment: Option<f64>) -> RoiMetrics {
    let total_revenue = monthly.column_sum("revenue");
    let total_sales = monthly.column_sum("sales");
    let investment = marketing_investment.unwrap_or(total_revenue * 0.15);

    let roi = if investment > 0.0 {
        (total_revenue - investment) / investment * 100.0
    } else {
        0.0
    };
    let cac = if total_sales > 0.0 { investment / total_sales } else { 0.0 };
    let ltv = if total_sales > 0.0 { total_revenue / total_sales } else { 0.0 };

    RoiMetrics {
        roi,
        cac,
        ltv,
        ltv_cac_ratio: if cac > 0.0 { ltv / cac } else { 0.0 },
        marketing_investment: investment,
        total_revenue,
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TopPerformers {
    pub top_states: Vec<LabeledShare>,
    pub top_brands: Vec<LabeledShare>,
    pub top_stores: Vec<LabeledShare>,
}

/// Top 3 of each ranking table by sales.
pub fn top_performers(states: &Table, brands: &Table, stores: &Table) -> TopPerformers {
    let top3 = |table: &Table, label_col: &str| -> Vec<LabeledShare> {
        let total = table.column_sum("sales");
        let label_idx = match table.column_index(label_col) {
            Some(i) => i,
            None => return Vec::new(),
        };
        let sales_idx = match table.column_index("sales") {
            Some(i) => i,
            None => return Vec::new(),
        };
        let mut entries: Vec<LabeledShare> = table
            .rows
            .iter()
            .map(|row| {
                let value = row[sales_idx].as_number().unwrap_or(0.0);
                LabeledShare {
                    label: row[label_idx].to_display(),
                    value,
                    share: if total > 0.0 { value / total * 100.0 } else { 0.0 },
                }
            })
            .collect();
        entries.sort_by(|a, b| b.value.total_cmp(&a.value));
        entries.truncate(3);
        entries
    };

    TopPerformers {
        top_states: top3(states, "state"),
        top_brands: top3(brands, "brand"),
        top_stores: top3(stores, "store"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_table;

    #[test]
    fn kpis_over_seed_data() {
        let monthly = default_table("monthly").unwrap();
        let k = kpis(&monthly);
        assert_eq!(k.total_revenue, 210083.0);
        assert_eq!(k.total_sales, 3788.0);
        assert_eq!(k.total_leads, 30580.0);
        assert!((k.avg_conversion - 12.387).abs() < 0.01);
    }

    #[test]
    fn kpis_on_empty_table_are_zero() {
        let mut monthly = default_table("monthly").unwrap();
        monthly.clear();
        let k = kpis(&monthly);
        assert_eq!(k.total_revenue, 0.0);
        assert_eq!(k.avg_conversion, 0.0);
    }

    #[test]
    fn summary_compares_last_two_months() {
        let monthly = default_table("monthly").unwrap();
        let s = monthly_summary(&monthly).unwrap();
        assert_eq!(s.last_month, "aug-21");
        assert_eq!(s.last_revenue, 68274.0);
        // (68274 - 58988) / 58988 * 100
        assert!((s.revenue_growth - 15.742).abs() < 0.01);
        assert!((s.sales_growth - 16.868).abs() < 0.01);
    }

    #[test]
    fn single_row_summary_has_zero_growth() {
        let mut monthly = default_table("monthly").unwrap();
        monthly.rows.truncate(1);
        let s = monthly_summary(&monthly).unwrap();
        assert_eq!(s.revenue_growth, 0.0);
        assert_eq!(s.sales_growth, 0.0);
    }

    #[test]
    fn slope_and_moving_average() {
        assert_eq!(linear_slope(&[1.0, 2.0, 3.0, 4.0]), 1.0);
        assert_eq!(linear_slope(&[5.0]), 0.0);
        assert!(linear_slope(&[4.0, 3.0, 2.0]) < 0.0);

        let ma = moving_average(&[3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(ma, vec![3.0, 4.5, 6.0, 9.0]);
    }

    #[test]
    fn trends_find_extremes() {
        let monthly = default_table("monthly").unwrap();
        let t = monthly_trends(&monthly).unwrap();
        assert!(t.revenue_slope > 0.0);
        assert_eq!(t.best_revenue_month.month, "aug-21");
        assert_eq!(t.worst_revenue_month.month, "sep-20");
        assert_eq!(t.best_sales_month.value, 1254.0);
        assert_eq!(t.revenue_moving_avg.len(), 12);
    }

    #[test]
    fn geographic_shares_and_regions() {
        let states = default_table("states").unwrap();
        let g = geographic(&states).unwrap();
        assert_eq!(g.total_states, 5);
        assert_eq!(g.total_sales, 1150.0);
        assert_eq!(g.standout_states[0].label, "São Paulo");
        assert!((g.standout_states[0].share - 63.826).abs() < 0.01);

        let southeast = g
            .sales_by_region
            .iter()
            .find(|r| r.label == "Southeast")
            .unwrap();
        assert_eq!(southeast.sum, 942.0);
        assert_eq!(southeast.count, 3);

        // Only São Paulo exceeds 1.5x the mean of 230.
        assert_eq!(g.high_performers.len(), 1);
    }

    #[test]
    fn brand_concentration() {
        let brands = default_table("brands").unwrap();
        let b = brand_performance(&brands).unwrap();
        assert_eq!(b.market_share[0].label, "FIAT");
        assert_eq!(b.cumulative_share.len(), 5);
        assert!((b.cumulative_share[4] - 100.0).abs() < 1e-9);
        assert!((b.concentration.top5_share - 100.0).abs() < 1e-9);
        assert!(b.concentration.top3_share < 100.0);
        assert!(b.concentration.herfindahl_index > 0.0 && b.concentration.herfindahl_index < 1.0);
        // All five brands sit under 36% share; four under 10%? No: shares are
        // 27/25.7/20.9/14.7/11.7 — none below 10.
        assert!(b.growth_candidates.is_empty());
    }

    #[test]
    fn store_outliers() {
        let stores = default_table("stores").unwrap();
        let s = store_performance(&stores).unwrap();
        assert_eq!(s.total_stores, 5);
        assert!((s.metrics.mean_sales - 12.6).abs() < 1e-9);
        // Sales 18,15,10,10,10: only the 18 exceeds mean + std.
        assert_eq!(s.high_performers.len(), 1);
        assert_eq!(s.high_performers[0].store, "KIYOKO CILEIDI JERY LTDA");
        assert!(s.low_performers.is_empty());
    }

    #[test]
    fn visits_split_and_recommendations() {
        let visits = default_table("visits").unwrap();
        let v = visits_patterns(&visits).unwrap();
        assert_eq!(v.total_visits, 6353.0);
        assert_eq!(v.daily_distribution[0].weekday, "sunday");
        assert_eq!(v.week_split.weekday_visits, 5609.0);
        assert_eq!(v.week_split.weekend_visits, 744.0);
        // Peak monday (1301) vs trough sunday (67): ratio > 3.
        assert!(v.recommendations.iter().any(|r| r.contains("monday")));
        // Weekend share is ~11.7%, below the 20% threshold.
        assert!(v.recommendations.iter().any(|r| r.contains("weekend campaigns")));
    }

    #[test]
    fn roi_with_default_estimate() {
        let monthly = default_table("monthly").unwrap();
        let r = roi_metrics(&monthly, None);
        assert!((r.marketing_investment - 210083.0 * 0.15).abs() < 1e-6);
        // (revenue - 15% revenue) / (15% revenue) = 85/15.
        assert!((r.roi - 85.0 / 15.0 * 100.0).abs() < 1e-6);
        assert!(r.ltv_cac_ratio > 0.0);
    }

    #[test]
    fn roi_with_explicit_investment() {
        let monthly = default_table("monthly").unwrap();
        let r = roi_metrics(&monthly, Some(10_000.0));
        assert!((r.cac - 10_000.0 / 3788.0).abs() < 1e-9);
    }

    #[test]
    fn top_three_of_each() {
        let t = top_performers(
            &default_table("states").unwrap(),
            &default_table("brands").unwrap(),
            &default_table("stores").unwrap(),
        );
        assert_eq!(t.top_states.len(), 3);
        assert_eq!(t.top_brands[0].label, "FIAT");
        assert_eq!(t.top_stores[0].value, 18.0);
    }

    #[test]
    fn empty_tables_yield_none() {
        let empty = Table::new(vec!["sales".to_string()]);
        assert!(geographic(&empty).is_none());
        assert!(brand_performance(&empty).is_none());
        assert!(store_performance(&empty).is_none());
        assert!(visits_patterns(&empty).is_none());
        assert!(monthly_summary(&empty).is_none());
    }
}
