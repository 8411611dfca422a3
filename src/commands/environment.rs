use crate::app::App;
use crate::error::Result;
use crate::models::{Location, Person};

pub fn add_location(app: &App, location: Location) -> Result<Vec<Location>> {
    let state = app.store().update(|s| s.with_location(location))?;
    Ok(state.locations.clone())
}

pub fn get_locations(app: &App) -> Vec<Location> {
    app.snapshot().locations.clone()
}

pub fn add_person(app: &App, person: Person) -> Result<Vec<Person>> {
    let state = app.store().update(|s| s.with_person(person))?;
    Ok(state.people.clone())
}

pub fn get_people(app: &App) -> Vec<Person> {
    app.snapshot().people.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{app_in, CannedClient};
    use crate::error::WizardError;
    use crate::models::LocationType;
    use std::sync::Arc;

    #[test]
    fn nested_locations_and_people() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path(), Arc::new(CannedClient::new(&[])));

        add_location(&app, Location::new("HQ", LocationType::Office)).unwrap();
        let locations =
            add_location(&app, Location::new("Lobby", LocationType::Office).within("HQ")).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1].parent.as_deref(), Some("HQ"));

        let err = add_location(&app, Location::new("Annex", LocationType::Office).within("Nowhere"))
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidInput(_)));
        assert_eq!(get_locations(&app).len(), 2);

        add_person(&app, Person::new("Grace", 41).with_activity("meetings")).unwrap();
        assert!(add_person(&app, Person::new("", 30)).is_err());
        assert_eq!(get_people(&app).len(), 1);
    }
}
