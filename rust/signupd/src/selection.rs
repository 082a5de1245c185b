use crate::api::Signup;
use serde::Serialize;

/// State of the header checkbox, derived from the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectAllState {
    Unchecked,
    Checked,
    Indeterminate,
}

pub fn select_all_state(rows: &[Signup]) -> SelectAllState {
    let selected = rows.iter().filter(|r| r.selected).count();
    if selected == 0 {
        SelectAllState::Unchecked
    } else if selected == rows.len() {
        SelectAllState::Checked
    } else {
        SelectAllState::Indeterminate
    }
}

/// Header checkbox click: select everything unless everything already is.
pub fn toggle_select_all(rows: &mut [Signup]) {
    let select = select_all_state(rows) != SelectAllState::Checked;
    for row in rows.iter_mut() {
        row.selected = select;
    }
}

pub fn selected_ids(rows: &[Signup]) -> Vec<i64> {
    rows.iter().filter(|r| r.selected).map(|r| r.id).collect()
}

pub fn nothing_selected(rows: &[Signup]) -> bool {
    !rows.iter().any(|r| r.selected)
}

#[cfg(test)]
pub(crate) fn test_row(id: i64) -> Signup {
    Signup {
        id,
        period_number: Some(1),
        student_name: Some(format!("Student {}", id)),
        student_id: Some(format!("{:06}", id)),
        date_signed_up: None,
        reason: "L".to_string(),
        attendance_confirmed: false,
        date_attendance_confirmed: None,
        selected: false,
        extra: serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Signup> {
        vec![test_row(1), test_row(2), test_row(3)]
    }

    #[test]
    fn one_of_three_is_indeterminate() {
        let mut r = rows();
        r[0].selected = true;
        assert_eq!(select_all_state(&r), SelectAllState::Indeterminate);
        assert!(!nothing_selected(&r));
        assert_eq!(selected_ids(&r), vec![1]);
    }

    #[test]
    fn toggle_clears_when_all_selected() {
        let mut r = rows();
        r.iter_mut().for_each(|s| s.selected = true);
        assert_eq!(select_all_state(&r), SelectAllState::Checked);
        toggle_select_all(&mut r);
        assert!(r.iter().all(|s| !s.selected));
        assert_eq!(select_all_state(&r), SelectAllState::Unchecked);
    }

    #[test]
    fn toggle_selects_all_from_none_or_some() {
        let mut r = rows();
        assert!(nothing_selected(&r));
        toggle_select_all(&mut r);
        assert!(r.iter().all(|s| s.selected));

        let mut r = rows();
        r[1].selected = true;
        toggle_select_all(&mut r);
        assert_eq!(selected_ids(&r), vec![1, 2, 3]);
    }

    #[test]
    fn empty_table_is_unchecked() {
        let mut r: Vec<Signup> = Vec::new();
        assert_eq!(select_all_state(&r), SelectAllState::Unchecked);
        toggle_select_all(&mut r);
        assert!(nothing_selected(&r));
    }
}
