// 📝 Conclusions - one templated sentence per report

use crate::report::{Report, ReportQuery, ReportRows};

/// Closing sentence for a report, or `None` when there is nothing to say.
pub fn conclude(report: &Report) -> Option<String> {
    match &report.rows {
        ReportRows::MonthlyTotals(rows) => {
            if rows.is_empty() {
                return None;
            }
            let inflow: f64 = rows.iter().map(|r| r.inflow).sum();
            let outflow: f64 = rows.iter().map(|r| r.outflow).sum();
            Some(balance_sentence(inflow - outflow))
        }
        ReportRows::TopExpenses(rows) => rows.first().map(|top| {
            format!(
                "The most significant expense is **{}**, with a total of {}. \
                 This kind of spending weighs heavily on the cost structure and should be monitored closely.",
                top.detail,
                format_amount(top.outflow)
            )
        }),
        ReportRows::MemberTotals(rows) => rows.first().map(|top| {
            format!(
                "The member with the highest income in the period was **{}**, with a total of {}. \
                 This suggests strong participation in the association's operations.",
                top.party,
                format_amount(top.inflow)
            )
        }),
        ReportRows::MemberTimeline(rows) => {
            let (first, last) = (rows.first()?, rows.last()?);
            let party = match &report.query {
                ReportQuery::MemberIncome { party, .. } => party.label(),
                _ => "the member",
            };
            let trend = if rows.len() < 2 || last.inflow == first.inflow {
                "a stable trend over time, reflecting a steady flow of contributions or sales"
            } else if last.inflow > first.inflow {
                "a rising trend over time, with contributions growing across the period"
            } else {
                "a falling trend over time; it may be worth following up on recent contributions"
            };
            Some(format!("Income from **{}** shows {}.", party, trend))
        }
    }
}

fn balance_sentence(balance: f64) -> String {
    if balance > 0.0 {
        format!(
            "Over the selected period total income exceeded expenses, with a positive balance of {}. \
             This reflects sound financial management.",
            format_amount(balance)
        )
    } else if balance < 0.0 {
        format!(
            "Over the selected period expenses exceeded income, leaving a deficit of {}. \
             Review the months with the largest outflows.",
            format_amount(balance.abs())
        )
    } else {
        "Income and expenses were equal, reflecting a financial balance over the period.".to_string()
    }
}

/// Whole units with thousands separators: `1234567.8` -> `1,234,568`.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
