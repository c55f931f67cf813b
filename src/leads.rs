//! Lead-side KPIs, demographic analysis and vehicle preference analytics.

use crate::sales::LabeledShare;
use crate::table::Table;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct TopVehicle {
    pub brand: String,
    pub model: String,
    pub visits: f64,
}

/// Headline lead KPIs across the demographic tables.
#[derive(Clone, Debug, Serialize)]
pub struct LeadsKpis {
    pub total_leads: f64,
    pub total_visits: f64,
    pub women_leads: f64,
    pub men_leads: f64,
    pub women_percent: f64,
    pub men_percent: f64,
    pub top_vehicle: Option<TopVehicle>,
}

pub fn kpis(gender: &Table, vehicle_condition: &Table, vehicles_visited: &Table) -> LeadsKpis {
    let total_leads = gender.column_sum("leads");
    let leads_for = |label: &str| -> f64 {
        gender
            .rows
            .iter()
            .find(|row| {
                gender
                    .column_index("gender")
                    .map(|i| row[i].to_display() == label)
                    .unwrap_or(false)
            })
            .and_then(|row| row[gender.column_index("leads")?].as_number())
            .unwrap_or(0.0)
    };
    let women_leads = leads_for("women");
    let men_leads = leads_for("men");

    let top_vehicle = vehicles_visited.max_row("visits").and_then(|row| {
        Some(TopVehicle {
            brand: vehicles_visited.get(row, "brand")?.to_display(),
            model: vehicles_visited.get(row, "model")?.to_display(),
            visits: vehicles_visited.get(row, "visits")?.as_number()?,
        })
    });

    LeadsKpis {
        total_leads,
        total_visits: vehicle_condition.column_sum("visits"),
        women_leads,
        men_leads,
        women_percent: percent_of(women_leads, total_leads),
        men_percent: percent_of(men_leads, total_leads),
        top_vehicle,
    }
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

#[derive(Clone, Debug, Serialize)]
pub struct Predominant {
    pub label: String,
    pub percent: f64,
}

/// Who the leads are: dominant groups, group diversity and how concentrated
/// each distribution is.
#[derive(Clone, Debug, Serialize)]
pub struct DemographicSummary {
    pub predominant_gender: Predominant,
    pub predominant_age_band: Predominant,
    pub predominant_income_band: Predominant,
    pub predominant_job_status: Predominant,
    pub age_band_count: usize,
    pub income_band_count: usize,
    pub job_status_count: usize,
    /// Sum of squared percent shares normalized to 0..=1, per distribution.
    pub age_concentration: f64,
    pub income_concentration: f64,
    pub job_concentration: f64,
    pub insights: Vec<String>,
}

pub fn demographic_summary(
    gender: &Table,
    age_band: &Table,
    income_band: &Table,
    job_status: &Table,
) -> Option<DemographicSummary> {
    let total_leads = gender.column_sum("leads");
    let gender_row = gender.max_row("leads")?;
    let predominant_gender = Predominant {
        label: gender.get(gender_row, "gender")?.to_display(),
        percent: percent_of(
            gender.get(gender_row, "leads")?.as_number().unwrap_or(0.0),
            total_leads,
        ),
    };

    let predominant_age_band = predominant(age_band, "band", "leads_percent")?;
    let predominant_income_band = predominant(income_band, "band", "leads_percent")?;
    let predominant_job_status = predominant(job_status, "status", "leads_percent")?;

    let mut insights = Vec::new();
    let gender_gap = (2.0 * predominant_gender.percent - 100.0).abs();
    if gender_gap > 20.0 {
        insights.push(format!(
            "{} outnumber the other gender by {:.1} percentage points",
            predominant_gender.label, gender_gap
        ));
    }
    if predominant_age_band.percent > 45.0 {
        insights.push(format!(
            "lead base is concentrated in the {} age band ({:.0}%)",
            predominant_age_band.label, predominant_age_band.percent
        ));
    }
    if predominant_income_band.percent > 60.0 {
        insights.push(format!(
            "income is heavily concentrated in the {} band ({:.0}%)",
            predominant_income_band.label, predominant_income_band.percent
        ));
    }

    Some(DemographicSummary {
        predominant_gender,
        predominant_age_band,
        predominant_income_band,
        predominant_job_status,
        age_band_count: age_band.len(),
        income_band_count: income_band.len(),
        job_status_count: job_status.len(),
        age_concentration: concentration(&age_band.numeric_column("leads_percent")),
        income_concentration: concentration(&income_band.numeric_column("leads_percent")),
        job_concentration: concentration(&job_status.numeric_column("leads_percent")),
        insights,
    })
}

fn predominant(table: &Table, label_col: &str, value_col: &str) -> Option<Predominant> {
    let row = table.max_row(value_col)?;
    Some(Predominant {
        label: table.get(row, label_col)?.to_display(),
        percent: table.get(row, value_col)?.as_number()?,
    })
}

/// Sum of squared percent shares, normalized to 0..=1.
fn concentration(percents: &[f64]) -> f64 {
    percents.iter().map(|p| p * p).sum::<f64>() / 10_000.0
}

/// Segments worth targeting: dominant occupation and age band, plus the
/// upper income bands when they carry meaningful weight together.
#[derive(Clone, Debug, Serialize)]
pub struct HighValueSegments {
    /// Set when a single occupation holds more than half the leads.
    pub dominant_occupation: Option<Predominant>,
    /// Set when a single age band holds more than 40% of the leads.
    pub dominant_age_band: Option<Predominant>,
    /// Bands from 10000 upward with their combined share.
    pub premium_income_bands: Vec<LabeledShare>,
    pub premium_income_share: f64,
    pub premium_segment_flag: bool,
}

pub fn high_value_segments(
    job_status: &Table,
    age_band: &Table,
    income_band: &Table,
) -> HighValueSegments {
    let dominant_occupation =
        predominant(job_status, "status", "leads_percent").filter(|p| p.percent > 50.0);
    let dominant_age_band =
        predominant(age_band, "band", "leads_percent").filter(|p| p.percent > 40.0);

    let premium_income_bands: Vec<LabeledShare> = income_band
        .rows
        .iter()
        .filter_map(|row| {
            let label = row[income_band.column_index("band")?].to_display();
            if !["10000", "15000", "20000"]
                .iter()
                .any(|floor| label.starts_with(floor))
            {
                return None;
            }
            let value = row[income_band.column_index("leads_percent")?]
                .as_number()
                .unwrap_or(0.0);
            Some(LabeledShare {
                label,
                value,
                share: value,
            })
        })
        .collect();
    let premium_income_share: f64 = premium_income_bands.iter().map(|b| b.value).sum();

    HighValueSegments {
        dominant_occupation,
        dominant_age_band,
        premium_income_bands,
        premium_income_share,
        premium_segment_flag: premium_income_share > 10.0,
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BrandVisitStats {
    pub brand: String,
    pub visits: f64,
    pub models: usize,
    pub mean_visits: f64,
    pub share: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryTrend {
    pub category: String,
    pub visits: f64,
    pub share: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct VehiclePreferences {
    pub new_visits: f64,
    pub used_visits: f64,
    /// Fraction 0..=1 of visits to new vehicles.
    pub new_share: f64,
    pub preferred_age_band: Option<Predominant>,
    /// Per-brand visit totals, sorted descending.
    pub brand_stats: Vec<BrandVisitStats>,
    pub top3_brand_share: f64,
    pub top5_brand_share: f64,
    pub active_brands: usize,
    pub category_trends: Vec<CategoryTrend>,
    pub recommendations: Vec<String>,
}

const COMPACT_MODELS: &[&str] = &[
    "ONIX", "CELTA", "HB20", "KA", "FIESTA", "GOL", "FOX", "SANDERO", "PALIO", "UNO", "PRISMA",
];
const SEDAN_MODELS: &[&str] = &["A3", "A4", "A5", "A6", "A7"];
const SUV_MODELS: &[&str] = &["X1", "Q3", "Q5", "Q7"];
const SPORT_MODELS: &[&str] = &["R8", "RS4", "TT", "TTS"];

pub fn vehicle_preferences(
    vehicle_condition: &Table,
    vehicle_age: &Table,
    vehicles_visited: &Table,
) -> Option<VehiclePreferences> {
    let condition_visits = |label: &str| -> f64 {
        vehicle_condition
            .rows
            .iter()
            .find(|row| {
                vehicle_condition
                    .column_index("condition")
                    .map(|i| row[i].to_display() == label)
                    .unwrap_or(false)
            })
            .and_then(|row| row[vehicle_condition.column_index("visits")?].as_number())
            .unwrap_or(0.0)
    };
    let new_visits = condition_visits("new");
    let used_visits = condition_visits("used");
    let condition_total = new_visits + used_visits;
    let new_share = if condition_total > 0.0 { new_visits / condition_total } else { 0.0 };

    let preferred_age_band = predominant(vehicle_age, "band", "visits_percent");

    let brand_idx = vehicles_visited.column_index("brand")?;
    let visits_idx = vehicles_visited.column_index("visits")?;
    let model_idx = vehicles_visited.column_index("model")?;

    let mut brands: Vec<(String, f64, usize)> = Vec::new();
    for row in &vehicles_visited.rows {
        let brand = row[brand_idx].to_display();
        let visits = row[visits_idx].as_number().unwrap_or(0.0);
        match brands.iter_mut().find(|(b, _, _)| *b == brand) {
            Some((_, sum, count)) => {
                *sum += visits;
                *count += 1;
            }
            None => brands.push((brand, visits, 1)),
        }
    }
    let model_total: f64 = brands.iter().map(|(_, sum, _)| sum).sum();
    let mut brand_stats: Vec<BrandVisitStats> = brands
        .into_iter()
        .map(|(brand, visits, models)| BrandVisitStats {
            brand,
            visits,
            models,
            mean_visits: visits / models as f64,
            share: percent_of(visits, model_total),
        })
        .collect();
    brand_stats.sort_by(|a, b| b.visits.total_cmp(&a.visits));

    let top3_brand_share: f64 = brand_stats.iter().take(3).map(|b| b.share).sum();
    let top5_brand_share: f64 = brand_stats.iter().take(5).map(|b| b.share).sum();
    let active_brands = brand_stats.iter().filter(|b| b.visits > 0.0).count();

    let category_sum = |models: &[&str]| -> f64 {
        vehicles_visited
            .rows
            .iter()
            .filter(|row| models.contains(&row[model_idx].to_display().as_str()))
            .map(|row| row[visits_idx].as_number().unwrap_or(0.0))
            .sum()
    };
    let category_trends: Vec<CategoryTrend> = [
        ("compact", COMPACT_MODELS),
        ("sedan", SEDAN_MODELS),
        ("suv", SUV_MODELS),
        ("sport", SPORT_MODELS),
    ]
    .iter()
    .map(|(category, models)| {
        let visits = category_sum(models);
        CategoryTrend {
            category: category.to_string(),
            visits,
            share: percent_of(visits, model_total),
        }
    })
    .collect();

    let mut recommendations = Vec::new();
    if new_share > 0.7 {
        recommendations.push("focus inventory on new vehicles".to_string());
    } else if new_share < 0.3 {
        recommendations.push("expand the used vehicle inventory".to_string());
    } else {
        recommendations.push("keep a balanced new/used inventory mix".to_string());
    }
    if let Some(band) = &preferred_age_band {
        recommendations.push(format!("prioritize vehicles {}", band.label));
    }
    let top_brands: Vec<&str> = brand_stats.iter().take(3).map(|b| b.brand.as_str()).collect();
    if !top_brands.is_empty() {
        recommendations.push(format!("stock up on demanded brands: {}", top_brands.join(", ")));
    }

    Some(VehiclePreferences {
        new_visits,
        used_visits,
        new_share,
        preferred_age_band,
        brand_stats,
        top3_brand_share,
        top5_brand_share,
        active_brands,
        category_trends,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::default_table;

    #[test]
    fn kpis_over_seed_data() {
        let k = kpis(
            &default_table("gender").unwrap(),
            &default_table("vehicle_condition").unwrap(),
            &default_table("vehicles_visited").unwrap(),
        );
        assert_eq!(k.total_leads, 25109.0);
        assert_eq!(k.total_visits, 30580.0);
        assert_eq!(k.women_leads, 15106.0);
        assert!((k.women_percent - 60.161).abs() < 0.01);
        assert!((k.women_percent + k.men_percent - 100.0).abs() < 1e-9);
        let top = k.top_vehicle.unwrap();
        assert_eq!(top.brand, "FIAT");
        assert_eq!(top.model, "PALIO");
        assert_eq!(top.visits, 1699.0);
    }

    #[test]
    fn demographic_predominants_and_insights() {
        let d = demographic_summary(
            &default_table("gender").unwrap(),
            &default_table("age_band").unwrap(),
            &default_table("income_band").unwrap(),
            &default_table("job_status").unwrap(),
        )
        .unwrap();
        assert_eq!(d.predominant_gender.label, "women");
        assert_eq!(d.predominant_age_band.label, "20-40");
        assert_eq!(d.predominant_income_band.label, "5000-10000");
        assert_eq!(d.predominant_job_status.label, "salaried");
        assert_eq!(d.age_band_count, 5);
        assert_eq!(d.job_status_count, 8);

        // Gender gap is ~20.3 points, age peak 49% and income peak 71%, so
        // all three insight rules fire.
        assert_eq!(d.insights.len(), 3);
        assert!(d.insights[0].contains("women"));
        assert!(d.insights[1].contains("20-40"));
        assert!(d.insights[2].contains("5000-10000"));
    }

    #[test]
    fn concentration_is_one_for_a_single_full_group() {
        assert_eq!(concentration(&[100.0]), 1.0);
        assert!(concentration(&[50.0, 50.0]) < 1.0);
    }

    #[test]
    fn high_value_segments_over_seed_data() {
        let h = high_value_segments(
            &default_table("job_status").unwrap(),
            &default_table("age_band").unwrap(),
            &default_table("income_band").unwrap(),
        );
        assert_eq!(h.dominant_occupation.unwrap().label, "salaried");
        assert_eq!(h.dominant_age_band.unwrap().label, "20-40");
        // 10000-15000 (10) + 15000-20000 (2) + 20000+ (2).
        assert_eq!(h.premium_income_bands.len(), 3);
        assert_eq!(h.premium_income_share, 14.0);
        assert!(h.premium_segment_flag);
    }

    #[test]
    fn vehicle_preferences_over_seed_data() {
        let v = vehicle_preferences(
            &default_table("vehicle_condition").unwrap(),
            &default_table("vehicle_age").unwrap(),
            &default_table("vehicles_visited").unwrap(),
        )
        .unwrap();
        assert_eq!(v.new_visits, 1162.0);
        assert_eq!(v.used_visits, 29418.0);
        assert!(v.new_share < 0.3);
        assert_eq!(v.preferred_age_band.as_ref().unwrap().label, "8 to 10 years");

        assert_eq!(v.brand_stats[0].brand, "FIAT");
        assert_eq!(v.brand_stats[0].visits, 3084.0);
        assert_eq!(v.brand_stats[0].models, 2);
        assert_eq!(v.active_brands, 8);
        assert!((v.top3_brand_share - 66.26).abs() < 0.01);
        assert!(v.top5_brand_share > v.top3_brand_share);

        let compact = v
            .category_trends
            .iter()
            .find(|c| c.category == "compact")
            .unwrap();
        assert_eq!(compact.visits, 12330.0);
        let sport = v.category_trends.iter().find(|c| c.category == "sport").unwrap();
        assert_eq!(sport.visits, 7.0);

        assert!(v.recommendations[0].contains("used"));
        assert!(v.recommendations.iter().any(|r| r.contains("FIAT")));
    }

    #[test]
    fn missing_condition_rows_fall_back_to_zero() {
        let condition = Table::new(vec!["condition".into(), "visits".into()]);
        let v = vehicle_preferences(
            &condition,
            &default_table("vehicle_age").unwrap(),
            &default_table("vehicles_visited").unwrap(),
        )
        .unwrap();
        assert_eq!(v.new_visits, 0.0);
        assert_eq!(v.new_share, 0.0);
    }
}
