use super::{
    edit::Splice,
    snapshot::{paired_key, Snapshot},
};
use crate::{
    error::{Error, Result},
    fragment::Fragment,
};

pub(super) fn plan(snapshot: &Snapshot, path: &str, to: &str) -> Result<Splice> {
    let target = snapshot.resolve(path)?;
    let (parent, index) = target.entry("rename")?;
    if !parent.is_mapping() {
        return Err(Error::TypeMismatch(format!(
            "`{path}` is a {} element, only mapping keys can be renamed",
            parent.kind().name()
        )));
    }

    let name = Fragment::render(&to.into())?;
    if name.is_multiline() {
        return Err(Error::UnsupportedEdit(format!(
            "key {to:?} does not fit on one line"
        )));
    }

    let key = paired_key(parent, index)?;
    Ok(Splice::replace(snapshot.span(key), name.text()))
}
